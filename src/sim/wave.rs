//! Wave generation
//!
//! A wave is emitted as one batch when prep ends. Enemies are staggered by
//! starting them at increasingly negative fractions of the first segment, so
//! they walk onto the map one after another instead of arriving together.

use super::catalog::Difficulty;
use super::state::{Enemy, EnemyClass, Lifecycle, PathPos};
use crate::consts::SPAWN_SPACING;

/// Titles cycled through as waves start
const WAVE_TITLES: [&str; 10] = [
    "Static in the Halls",
    "The First Watch",
    "Movement in the Kitchen",
    "The Music Box Winds",
    "Shadows in the Corner",
    "Vent Ventilation Failure",
    "Power Reserves Dwindling",
    "The Grand Re-Opening",
    "Foxy's Sprint",
    "Golden Hallucinations",
];

/// Flavor title shown when `wave` starts
pub fn wave_title(wave: u32) -> &'static str {
    WAVE_TITLES[wave as usize % WAVE_TITLES.len()]
}

/// Number of enemies in `wave`
pub fn wave_size(wave: u32, boss_rush: bool) -> usize {
    if boss_rush {
        2 + (wave / 2) as usize
    } else {
        5 + 3 * wave as usize
    }
}

/// Generate the ordered enemy list for `wave` under `difficulty`.
///
/// Enemy ids are their spawn index; only one wave is ever alive at a time.
pub fn generate_wave(wave: u32, difficulty: Difficulty) -> Vec<Enemy> {
    let coeffs = difficulty.coefficients();
    let boss_rush = difficulty.is_boss_rush();
    let count = wave_size(wave, boss_rush);

    (0..count)
        .map(|i| {
            let is_boss = boss_rush || (wave % 5 == 0 && i == count - 1);

            let (base_hp, base_speed) = if is_boss {
                (300 + 200 * wave, 0.007)
            } else {
                (30 + 30 * wave, 0.012 + 0.001 * wave as f32)
            };

            let class = if is_boss {
                EnemyClass::Boss
            } else if wave > 8 {
                EnemyClass::Nightmare
            } else if wave > 4 {
                EnemyClass::Zombie
            } else {
                EnemyClass::Human
            };

            let max_hp = (base_hp as f64 * coeffs.hp_mult).floor() as u32;
            let speed = base_speed * coeffs.speed_mult;
            let fraction = -SPAWN_SPACING * i as f32;

            Enemy {
                id: i as u32,
                class,
                max_hp,
                hp: max_hp as i64,
                speed,
                base_speed: speed,
                pos: PathPos {
                    segment: 0,
                    fraction,
                },
                slow_ticks: 0,
                lifecycle: if fraction < 0.0 {
                    Lifecycle::NotYetVisible
                } else {
                    Lifecycle::Active
                },
            }
        })
        .collect()
}
