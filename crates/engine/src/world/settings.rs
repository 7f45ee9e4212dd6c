use super::position::BlockPos;

/// Game mode new players join the world with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub const fn id(self) -> i32 {
        match self {
            GameMode::Survival => 0,
            GameMode::Creative => 1,
            GameMode::Adventure => 2,
            GameMode::Spectator => 3,
        }
    }

    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(GameMode::Survival),
            1 => Some(GameMode::Creative),
            2 => Some(GameMode::Adventure),
            3 => Some(GameMode::Spectator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Peaceful,
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const fn id(self) -> i8 {
        match self {
            Difficulty::Peaceful => 0,
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
        }
    }

    pub const fn from_id(id: i8) -> Option<Self> {
        match id {
            0 => Some(Difficulty::Peaceful),
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Normal),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// World-level state that must survive a restart.
///
/// Owned by the world; providers only persist and return it. A provider with
/// nothing persisted hands out [`Settings::default`], so settings are never
/// partially absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub name: String,
    pub spawn: BlockPos,
    /// Time of day in ticks.
    pub time: i64,
    /// Whether `time` advances.
    pub time_cycle: bool,
    pub rain_time: i64,
    pub raining: bool,
    pub thunder_time: i64,
    pub thundering: bool,
    pub weather_cycle: bool,
    /// Ticks the world has been simulated for.
    pub current_tick: i64,
    pub default_game_mode: GameMode,
    pub difficulty: Difficulty,
    /// Radius in chunks around players in which chunks are ticked.
    pub tick_range: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "World".into(),
            spawn: BlockPos::new(0, 80, 0),
            time: 0,
            time_cycle: true,
            rain_time: 0,
            raining: false,
            thunder_time: 0,
            thundering: false,
            weather_cycle: true,
            current_tick: 0,
            default_game_mode: GameMode::Survival,
            difficulty: Difficulty::Normal,
            tick_range: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_ids_round_trip() {
        for mode in [GameMode::Survival, GameMode::Creative, GameMode::Adventure, GameMode::Spectator] {
            assert_eq!(GameMode::from_id(mode.id()), Some(mode));
        }
        for difficulty in [Difficulty::Peaceful, Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Difficulty::from_id(difficulty.id()), Some(difficulty));
        }
        assert_eq!(GameMode::from_id(7), None);
        assert_eq!(Difficulty::from_id(-1), None);
    }
}
