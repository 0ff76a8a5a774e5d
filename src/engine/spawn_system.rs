use super::*;

impl RoundState {
    pub(super) fn spawn_players(&mut self) {
        let right = self.grid.cols() - 2;
        let spawns = [
            (PlayerId::One, Vec2::new(1, 1), Direction::Right),
            (PlayerId::Two, Vec2::new(right, 1), Direction::Left),
        ];
        self.players = spawns
            .into_iter()
            .map(|(id, spawn, facing)| Player {
                id,
                actor: Actor::new(spawn, facing),
                spawn,
                spawn_facing: facing,
                buffered: None,
                lives: self.options.starting_lives,
                score: 0,
                active: true,
                power: ModeTimer::default(),
                super_power: ModeTimer::default(),
                mouth_frame: 0,
            })
            .collect();
    }

    /// Ghosts line up on the center row, left to right Pink, Red, Cyan, Orange.
    pub(super) fn spawn_ghosts(&mut self) {
        let center = self.grid.center();
        let offsets = [-1, -2, 0, 1];
        self.ghosts = GhostColor::ALL
            .into_iter()
            .zip(offsets)
            .map(|(color, dx)| Ghost {
                color,
                actor: Actor::new(Vec2::new(center.x + dx, center.y), Direction::Up),
                last_direction: None,
                direction_cooldown: 0,
            })
            .collect();
    }

    pub(super) fn respawn_ghost(&mut self, ghost_idx: usize) {
        let center = self.grid.center();
        let Some(ghost) = self.ghosts.get_mut(ghost_idx) else {
            return;
        };
        ghost.actor.teleport(center, Direction::Up);
        ghost.direction_cooldown = GHOST_RESPAWN_COOLDOWN;
    }

    /// Back to spawn after losing a life. Score, lives and mode timers stay.
    pub(super) fn reset_player_position(&mut self, player_idx: usize) {
        let Some(player) = self.players.get_mut(player_idx) else {
            return;
        };
        player.actor.teleport(player.spawn, player.spawn_facing);
        player.actor.desired = None;
        player.buffered = None;
    }

    /// Tiles other ghosts stand on or are moving into.
    pub(super) fn claimed_by_other_ghosts(&self, ghost_idx: usize) -> Vec<Vec2> {
        self.ghosts
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != ghost_idx)
            .flat_map(|(_, ghost)| std::iter::once(ghost.actor.tile).chain(ghost.actor.target()))
            .collect()
    }
}
