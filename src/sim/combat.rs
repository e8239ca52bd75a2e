//! Fixed timestep combat tick
//!
//! One logic tick resolves, in order:
//! 1. Movement (slow timers, path advance, enemies reaching the base)
//! 2. Tower firing (cooldown, nearest-in-range target, instant damage)
//! 3. Projectile expiry
//! 4. Death resolution and kill rewards
//! 5. Wave-cleared / defeat roll-up

use super::catalog::{Ability, Catalog, Difficulty, PotionKind};
use super::path::Path;
use super::state::{GameState, Lifecycle, Phase, Projectile};
use crate::consts::*;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub shots: u32,
    pub kills: u32,
    /// Enemies that reached the base
    pub leaks: u32,
    /// Coins awarded for kills
    pub reward: u64,
}

/// Result of a batch of ticks run inside one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub ticks_run: u32,
    pub totals: TickOutcome,
    /// Health hit zero; the rest of the batch was not run
    pub defeated: bool,
}

/// True when logic ticks have anything to do
pub fn is_runnable(state: &GameState) -> bool {
    (state.is_wave_active() || !state.projectiles.is_empty()) && !state.is_game_over
}

/// Kill reward for an enemy with `max_hp`, before multipliers
pub fn base_reward(max_hp: u32) -> u64 {
    (max_hp as f64 * REWARD_HP_RATIO + REWARD_FLAT).floor() as u64
}

/// Kill reward after difficulty and money-potion multipliers
pub fn scaled_reward(max_hp: u32, coin_mult: f64, money_mult: f64) -> u64 {
    (base_reward(max_hp) as f64 * coin_mult * money_mult).floor() as u64
}

/// Pure form of [`step`]: produce the next state from `state`
pub fn advance_one_tick(state: &GameState, catalog: &Catalog, path: &Path) -> GameState {
    let mut next = state.clone();
    step(&mut next, catalog, path);
    next
}

/// Run up to `ticks` logic ticks, halting as soon as the session is defeated.
///
/// Does nothing if the session has no live wave or projectiles.
pub fn run_batch(state: &mut GameState, catalog: &Catalog, path: &Path, ticks: u32) -> BatchOutcome {
    let mut batch = BatchOutcome::default();
    if !is_runnable(state) {
        return batch;
    }

    for _ in 0..ticks {
        let outcome = step(state, catalog, path);
        batch.ticks_run += 1;
        batch.totals.shots += outcome.shots;
        batch.totals.kills += outcome.kills;
        batch.totals.leaks += outcome.leaks;
        batch.totals.reward += outcome.reward;

        if state.is_game_over {
            batch.defeated = true;
            break;
        }
    }

    batch
}

/// Advance the session by one logic tick in place
pub fn step(state: &mut GameState, catalog: &Catalog, path: &Path) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    state.tick += 1;
    let tick = state.tick;

    // --- MOVEMENT ---
    let final_index = path.final_index();
    for enemy in &mut state.enemies {
        if enemy.slow_ticks > 0 {
            enemy.slow_ticks -= 1;
            enemy.speed = enemy.base_speed * SLOW_FACTOR;
        } else {
            enemy.speed = enemy.base_speed;
        }

        enemy.pos.fraction += enemy.speed;
        if enemy.lifecycle == Lifecycle::NotYetVisible && enemy.pos.fraction >= 0.0 {
            enemy.lifecycle = Lifecycle::Active;
        }

        if enemy.pos.fraction >= 1.0 {
            enemy.pos.fraction = 0.0;
            enemy.pos.segment += 1;
            if enemy.pos.segment >= final_index {
                state.health = state.health.saturating_sub(enemy.class.base_damage());
                enemy.lifecycle = Lifecycle::Removed;
                outcome.leaks += 1;
                log::trace!("Enemy {} reached the base (health {})", enemy.id, state.health);
            }
        }
    }
    state.enemies.retain(|e| e.lifecycle != Lifecycle::Removed);

    // --- FIRING ---
    for tower in &mut state.towers {
        let Some(unit) = catalog.get(&tower.unit_id) else {
            continue;
        };
        let damage = unit.damage_at(tower.level);
        let fire_rate = unit.fire_rate_at(tower.level) as u64;
        if tick.saturating_sub(tower.last_fired) < fire_rate {
            continue;
        }

        // Nearest targetable enemy within range; first seen wins exact ties
        let origin = tower.pos.as_vec2();
        let mut target: Option<(usize, f32)> = None;
        for (idx, enemy) in state.enemies.iter().enumerate() {
            if !enemy.is_targetable() {
                continue;
            }
            let dist = path
                .point_at(enemy.pos.segment, enemy.pos.fraction)
                .distance(origin);
            if dist > unit.range {
                continue;
            }
            if target.is_none_or(|(_, best)| dist < best) {
                target = Some((idx, dist));
            }
        }

        let Some((idx, _)) = target else {
            continue;
        };
        let enemy = &mut state.enemies[idx];
        enemy.hp -= damage as i64;
        tower.last_fired = tick;
        if unit.ability == Some(Ability::Slow) {
            enemy.slow_ticks = SLOW_DURATION_TICKS;
        }
        state.projectiles.push(Projectile {
            start: origin,
            end: path.point_at(enemy.pos.segment, enemy.pos.fraction),
            start_tick: tick,
            lifetime: PROJECTILE_LIFETIME_TICKS,
            color: unit.color,
        });
        outcome.shots += 1;
    }

    // --- PROJECTILE EXPIRY ---
    state.projectiles.retain(|p| !p.is_expired(tick));

    // --- DEATHS ---
    let coin_mult = coin_multiplier(state.difficulty);
    let money_mult = state.effect_multiplier(PotionKind::Money);
    for enemy in &mut state.enemies {
        if enemy.hp <= 0 {
            let reward = scaled_reward(enemy.max_hp, coin_mult, money_mult);
            state.coins += reward;
            outcome.reward += reward;
            outcome.kills += 1;
            enemy.lifecycle = Lifecycle::Removed;
            log::trace!("Enemy {} killed (+{} coins)", enemy.id, reward);
        }
    }
    state.enemies.retain(|e| e.lifecycle != Lifecycle::Removed);

    // --- ROLL-UP ---
    if state.health == 0 {
        state.is_game_over = true;
        state.phase = Phase::Defeat;
        log::info!("Base overrun on wave {} - shift over", state.wave);
    } else if state.phase == Phase::WaveActive && state.enemies.is_empty() {
        state.phase = Phase::Idle;
        log::info!("Wave {} cleared ({} coins)", state.wave, state.coins);
    }

    outcome
}

/// Coin multiplier of the session's difficulty (Medium until one is chosen)
pub fn coin_multiplier(difficulty: Option<Difficulty>) -> f64 {
    difficulty.unwrap_or_default().coefficients().coin_mult
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::path::GridPos;
    use crate::sim::state::{ActiveEffect, Enemy, EnemyClass, PathPos, Tower};
    use crate::sim::{PotionTier, generate_wave};

    fn wave_state(difficulty: Difficulty) -> GameState {
        let mut state = GameState::new();
        state.difficulty = Some(difficulty);
        state.phase = Phase::WaveActive;
        state.wave = 1;
        state
    }

    fn enemy(id: u32, class: EnemyClass, hp: u32, segment: usize, fraction: f32) -> Enemy {
        Enemy {
            id,
            class,
            max_hp: hp,
            hp: hp as i64,
            speed: 0.0,
            base_speed: 0.0,
            pos: PathPos { segment, fraction },
            slow_ticks: 0,
            lifecycle: if fraction < 0.0 {
                Lifecycle::NotYetVisible
            } else {
                Lifecycle::Active
            },
        }
    }

    fn place(state: &mut GameState, unit_id: &str, x: i32, y: i32, level: u32) -> u32 {
        let id = state.next_entity_id();
        state.towers.push(Tower {
            id,
            unit_id: unit_id.to_string(),
            pos: GridPos::new(x, y),
            level,
            last_fired: 0,
        });
        id
    }

    #[test]
    fn test_movement_advances_fraction() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        let mut e = enemy(0, EnemyClass::Human, 50, 0, 0.0);
        e.base_speed = 0.25;
        state.enemies.push(e);

        step(&mut state, &catalog, &path);
        assert!((state.enemies[0].pos.fraction - 0.25).abs() < 1e-6);

        for _ in 0..3 {
            step(&mut state, &catalog, &path);
        }
        assert_eq!(state.enemies[0].pos.segment, 1);
        assert_eq!(state.enemies[0].pos.fraction, 0.0);
    }

    #[test]
    fn test_slow_halves_speed_and_counts_down() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        let mut e = enemy(0, EnemyClass::Human, 50, 0, 0.0);
        e.base_speed = 0.1;
        e.slow_ticks = 2;
        state.enemies.push(e);

        step(&mut state, &catalog, &path);
        assert!((state.enemies[0].speed - 0.05).abs() < 1e-6);
        assert_eq!(state.enemies[0].slow_ticks, 1);
        step(&mut state, &catalog, &path);
        step(&mut state, &catalog, &path);
        assert!((state.enemies[0].speed - 0.1).abs() < 1e-6);
        assert!((state.enemies[0].pos.fraction - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_enemy_becomes_visible_at_zero() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        let mut e = enemy(0, EnemyClass::Human, 50, 0, -0.5);
        e.base_speed = 0.25;
        state.enemies.push(e);

        step(&mut state, &catalog, &path);
        assert_eq!(state.enemies[0].lifecycle, Lifecycle::NotYetVisible);
        step(&mut state, &catalog, &path);
        assert_eq!(state.enemies[0].lifecycle, Lifecycle::Active);
    }

    #[test]
    fn test_leak_damages_base_without_reward() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        let last_segment = path.final_index() - 1;

        let mut grunt = enemy(0, EnemyClass::Human, 50, last_segment, 0.95);
        grunt.base_speed = 0.1;
        let mut boss = enemy(1, EnemyClass::Boss, 500, last_segment, 0.95);
        boss.base_speed = 0.1;
        state.enemies.push(grunt);
        state.enemies.push(boss);
        let coins = state.coins;

        let outcome = step(&mut state, &catalog, &path);
        assert_eq!(outcome.leaks, 2);
        assert_eq!(state.health, STARTING_HEALTH - 1 - 5);
        assert_eq!(state.coins, coins);
        assert!(state.enemies.is_empty());
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_health_clamps_and_defeat() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        state.health = 3;
        let mut boss = enemy(0, EnemyClass::Boss, 500, path.final_index() - 1, 0.99);
        boss.base_speed = 0.1;
        state.enemies.push(boss);
        state.enemies.push(enemy(1, EnemyClass::Human, 50, 0, -3.0));

        step(&mut state, &catalog, &path);
        assert_eq!(state.health, 0);
        assert!(state.is_game_over);
        assert_eq!(state.phase, Phase::Defeat);
    }

    #[test]
    fn test_tower_respects_fire_rate() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        // freddy: 12 damage, range 2.5, fire rate 35
        place(&mut state, "freddy", 1, 4, 1);
        state.enemies.push(enemy(0, EnemyClass::Human, 10_000, 0, 0.3));

        for _ in 0..34 {
            assert_eq!(step(&mut state, &catalog, &path).shots, 0);
        }
        assert_eq!(step(&mut state, &catalog, &path).shots, 1);
        assert_eq!(state.towers[0].last_fired, 35);
        assert_eq!(state.enemies[0].hp, 10_000 - 12);

        for _ in 0..34 {
            assert_eq!(step(&mut state, &catalog, &path).shots, 0);
        }
        assert_eq!(step(&mut state, &catalog, &path).shots, 1);
        assert_eq!(state.towers[0].last_fired, 70);
    }

    #[test]
    fn test_targets_nearest_in_range() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        let id = place(&mut state, "freddy", 2, 4, 1);
        state.towers[0].last_fired = 0;
        state.tick = 100;
        // (0,5): dist sqrt(5) = 2.24, in range; (2,5): dist 1.0
        state.enemies.push(enemy(0, EnemyClass::Human, 100, 0, 0.0));
        state.enemies.push(enemy(1, EnemyClass::Human, 100, 0, 2.0 / 3.0));

        step(&mut state, &catalog, &path);
        assert_eq!(state.tower(id).unwrap().last_fired, 101);
        assert_eq!(state.enemies[0].hp, 100);
        assert_eq!(state.enemies[1].hp, 88);
    }

    #[test]
    fn test_exact_tie_keeps_first_seen() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        place(&mut state, "freddy", 1, 4, 1);
        state.tick = 100;
        // Both stand at (1.5, 5), the same distance from the tower
        state.enemies.push(enemy(0, EnemyClass::Human, 100, 0, 0.5));
        state.enemies.push(enemy(1, EnemyClass::Human, 100, 0, 0.5));

        step(&mut state, &catalog, &path);
        assert_eq!(state.enemies[0].hp, 88);
        assert_eq!(state.enemies[1].hp, 100);
    }

    #[test]
    fn test_ignores_out_of_range_and_unspawned() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        place(&mut state, "freddy", 0, 4, 1);
        state.tick = 100;
        // Not yet visible, right next to the tower
        state.enemies.push(enemy(0, EnemyClass::Human, 100, 0, -0.5));
        // Visible but far away at (8,2)
        state.enemies.push(enemy(1, EnemyClass::Human, 100, 3, 0.0));

        let outcome = step(&mut state, &catalog, &path);
        assert_eq!(outcome.shots, 0);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_slow_ability_applies_timer() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        place(&mut state, "balloon_boy", 1, 4, 1);
        state.tick = 100;
        state.enemies.push(enemy(0, EnemyClass::Human, 100, 0, 0.3));

        step(&mut state, &catalog, &path);
        assert_eq!(state.enemies[0].slow_ticks, SLOW_DURATION_TICKS);
        assert_eq!(state.enemies[0].hp, 98);
    }

    #[test]
    fn test_projectile_lifetime() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        place(&mut state, "freddy", 1, 4, 1);
        state.tick = 100;
        state.enemies.push(enemy(0, EnemyClass::Human, 10_000, 0, 0.3));

        step(&mut state, &catalog, &path);
        assert_eq!(state.projectiles.len(), 1);
        let shot = &state.projectiles[0];
        assert_eq!(shot.start_tick, 101);
        assert_eq!(shot.start, glam::Vec2::new(1.0, 4.0));
        assert!((shot.end.x - 0.9).abs() < 1e-5);

        for _ in 0..14 {
            step(&mut state, &catalog, &path);
        }
        assert_eq!(state.projectiles.len(), 1);
        step(&mut state, &catalog, &path);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_kill_reward_with_coin_multiplier() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        place(&mut state, "freddy", 1, 4, 1);
        state.tick = 100;
        let mut target = enemy(0, EnemyClass::Human, 100, 0, 0.3);
        target.hp = 5;
        state.enemies.push(target);
        let coins = state.coins;

        let outcome = step(&mut state, &catalog, &path);
        // floor(floor(100 * 0.15 + 5) * 1.5) = 30
        assert_eq!(outcome.reward, 30);
        assert_eq!(state.coins, coins + 30);
        assert!(state.enemies.is_empty());
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_money_potion_scales_reward() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Easy);
        state.effects.push(ActiveEffect {
            kind: PotionKind::Money,
            tier: PotionTier::Two,
            multiplier: 2.0,
            expires_at_ms: u64::MAX,
        });
        place(&mut state, "freddy", 1, 4, 1);
        state.tick = 100;
        let mut target = enemy(0, EnemyClass::Human, 90, 0, 0.3);
        target.hp = 1;
        state.enemies.push(target);

        let outcome = step(&mut state, &catalog, &path);
        // floor(90 * 0.15 + 5) = 18, * 1.0 * 2.0
        assert_eq!(outcome.reward, 36);
    }

    #[test]
    fn test_run_batch_halts_on_defeat() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        state.health = 1;
        let mut e = enemy(0, EnemyClass::Human, 50, path.final_index() - 1, 0.95);
        e.base_speed = 0.1;
        state.enemies.push(e);
        state.enemies.push(enemy(1, EnemyClass::Human, 50, 0, -10.0));

        let batch = run_batch(&mut state, &catalog, &path, 5);
        assert!(batch.defeated);
        assert_eq!(batch.ticks_run, 1);
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_run_batch_noop_when_idle() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = GameState::new();
        state.difficulty = Some(Difficulty::Medium);
        state.phase = Phase::Idle;

        let batch = run_batch(&mut state, &catalog, &path, 5);
        assert_eq!(batch.ticks_run, 0);
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn test_advance_one_tick_is_pure() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let mut state = wave_state(Difficulty::Medium);
        state.enemies = generate_wave(1, Difficulty::Medium);

        let next = advance_one_tick(&state, &catalog, &path);
        assert_eq!(state.tick, 0);
        assert_eq!(next.tick, 1);
        assert!(next.enemies[0].pos.fraction > state.enemies[0].pos.fraction);
    }

    #[test]
    fn test_full_wave_is_deterministic() {
        let catalog = Catalog::standard();
        let path = Path::standard();
        let setup = || {
            let mut state = wave_state(Difficulty::Hard);
            state.wave = 3;
            state.enemies = generate_wave(3, Difficulty::Hard);
            place(&mut state, "freddy", 2, 4, 3);
            place(&mut state, "balloon_boy", 4, 4, 1);
            place(&mut state, "foxy", 7, 3, 5);
            state
        };
        let mut a = setup();
        let mut b = setup();
        for _ in 0..3000 {
            step(&mut a, &catalog, &path);
            step(&mut b, &catalog, &path);
        }
        assert_eq!(a.health, b.health);
        assert_eq!(a.coins, b.coins);
        assert_eq!(a.enemies, b.enemies);
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn test_coin_multiplier_defaults_to_medium() {
        assert_eq!(coin_multiplier(None), 1.5);
        assert_eq!(coin_multiplier(Some(Difficulty::Extreme)), 4.0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Health never increases and stays within [0, starting health]
            #[test]
            fn prop_health_is_monotone(wave in 1u32..16, difficulty_idx in 0usize..5, ticks in 1usize..400) {
                let catalog = Catalog::standard();
                let path = Path::standard();
                let difficulty = Difficulty::ALL[difficulty_idx];
                let mut state = wave_state(difficulty);
                state.wave = wave;
                state.enemies = generate_wave(wave, difficulty);
                place(&mut state, "bonnie", 2, 4, 2);

                let mut prev = state.health;
                for _ in 0..ticks {
                    step(&mut state, &catalog, &path);
                    prop_assert!(state.health <= prev);
                    prop_assert!(state.health <= STARTING_HEALTH);
                    prev = state.health;
                }
            }

            /// Every shot happens at least a fire-rate after the previous one
            #[test]
            fn prop_fire_rate_respected(level in 1u32..=MAX_LEVEL, ticks in 1usize..300) {
                let catalog = Catalog::standard();
                let path = Path::standard();
                let mut state = wave_state(Difficulty::Medium);
                state.enemies = generate_wave(6, Difficulty::Extreme);
                place(&mut state, "foxy", 2, 4, level);
                let rate = catalog.get("foxy").unwrap().fire_rate_at(level) as u64;

                let mut last = state.towers[0].last_fired;
                for _ in 0..ticks {
                    let before = state.tick + 1;
                    let outcome = step(&mut state, &catalog, &path);
                    if outcome.shots > 0 {
                        prop_assert!(before - last >= rate);
                        prop_assert_eq!(state.towers[0].last_fired, before);
                        last = before;
                    }
                }
            }
        }
    }
}
