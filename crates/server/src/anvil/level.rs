//! World settings as a gzip-compressed NBT `level.dat`.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use voxelstore_engine::provider::BoxError;
use voxelstore_engine::world::position::BlockPos;
use voxelstore_engine::world::settings::{Difficulty, GameMode, Settings};

use super::DATA_VERSION;

#[derive(Serialize, Deserialize, Debug)]
struct LevelDat {
    #[serde(rename = "Data")]
    data: LevelData,
}

#[derive(Serialize, Deserialize, Debug)]
struct LevelData {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "LevelName")]
    level_name: String,
    #[serde(rename = "SpawnX")]
    spawn_x: i32,
    #[serde(rename = "SpawnY")]
    spawn_y: i32,
    #[serde(rename = "SpawnZ")]
    spawn_z: i32,
    #[serde(rename = "DayTime")]
    day_time: i64,
    #[serde(rename = "Time")]
    time: i64,
    raining: bool,
    #[serde(rename = "rainTime")]
    rain_time: i64,
    thundering: bool,
    #[serde(rename = "thunderTime")]
    thunder_time: i64,
    #[serde(rename = "GameType")]
    game_type: i32,
    #[serde(rename = "Difficulty")]
    difficulty: i8,
    #[serde(rename = "DoDaylightCycle")]
    do_daylight_cycle: bool,
    #[serde(rename = "DoWeatherCycle")]
    do_weather_cycle: bool,
    #[serde(rename = "TickRange")]
    tick_range: i32,
}

fn to_level_data(settings: &Settings) -> Result<LevelData, BoxError> {
    let coord = |v: i64, axis: &str| {
        i32::try_from(v).map_err(|_| format!("spawn {} = {} does not fit level.dat", axis, v))
    };
    Ok(LevelData {
        data_version: DATA_VERSION,
        level_name: settings.name.clone(),
        spawn_x: coord(settings.spawn.x, "x")?,
        spawn_y: coord(settings.spawn.y, "y")?,
        spawn_z: coord(settings.spawn.z, "z")?,
        day_time: settings.time,
        time: settings.current_tick,
        raining: settings.raining,
        rain_time: settings.rain_time,
        thundering: settings.thundering,
        thunder_time: settings.thunder_time,
        game_type: settings.default_game_mode.id(),
        difficulty: settings.difficulty.id(),
        do_daylight_cycle: settings.time_cycle,
        do_weather_cycle: settings.weather_cycle,
        tick_range: settings.tick_range,
    })
}

fn from_level_data(data: LevelData) -> Result<Settings, BoxError> {
    let default_game_mode = GameMode::from_id(data.game_type)
        .ok_or_else(|| format!("unknown GameType {}", data.game_type))?;
    let difficulty = Difficulty::from_id(data.difficulty)
        .ok_or_else(|| format!("unknown Difficulty {}", data.difficulty))?;
    Ok(Settings {
        name: data.level_name,
        spawn: BlockPos::new(data.spawn_x.into(), data.spawn_y.into(), data.spawn_z.into()),
        time: data.day_time,
        time_cycle: data.do_daylight_cycle,
        rain_time: data.rain_time,
        raining: data.raining,
        thunder_time: data.thunder_time,
        thundering: data.thundering,
        weather_cycle: data.do_weather_cycle,
        current_tick: data.time,
        default_game_mode,
        difficulty,
        tick_range: data.tick_range,
    })
}

/// Settings stored at `path`, or `None` if the file does not exist.
pub(crate) fn read(path: &Path) -> Result<Option<Settings>, BoxError> {
    let compressed = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut bytes)?;
    let level: LevelDat = fastnbt::from_bytes(&bytes)?;
    from_level_data(level.data).map(Some)
}

/// Replace the settings stored at `path` (through a temporary file).
pub(crate) fn write(path: &Path, settings: &Settings) -> Result<(), BoxError> {
    let level = LevelDat {
        data: to_level_data(settings)?,
    };
    let bytes = fastnbt::to_bytes(&level)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    let compressed = encoder.finish()?;

    let tmp = path.with_extension("dat_new");
    fs::write(&tmp, compressed)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
