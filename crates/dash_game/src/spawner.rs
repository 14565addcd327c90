//! Procedural generation.
//!
//! Three kinds of gate decide when something appears:
//! - per-frame probability (coins, spikes, stairs),
//! - score milestones (orbs, portals),
//! - spacing behind the newest asteroid (flying only).
//!
//! `generate` covers the endless-mode kinds. Asteroids come from
//! `spawn_asteroid`, which the session calls during any flight.
//!
//! A candidate that lands too close to something already on screen is simply
//! discarded for this frame; the next frame's roll gets another chance.

use rand::Rng;

use dash_core::config::GameConfig;

use crate::collision::{boxes_overlap, Aabb};
use crate::entities::{
    Asteroid, Coin, EntityRegistry, GreenOrb, Obstacle, OrangeOrb, Portal, Stair, COIN_POINTS,
    GREEN_ORB_SIZE, ORANGE_ORB_SIZE, PORTAL_SIZE, SPIKE_SIZE,
};
use crate::session::GameState;

pub const COIN_CHANCE: f64 = 0.01;
pub const OBSTACLE_CHANCE: f64 = 0.008;
pub const STAIR_CHANCE: f64 = 0.005;

const STAIR_WIDTHS: [f64; 3] = [40.0, 60.0, 80.0];
const STAIR_HEIGHTS: [f64; 3] = [30.0, 50.0, 70.0];
const ASTEROID_SIZES: [f64; 3] = [30.0, 50.0, 70.0];
const ASTEROID_SPACING: f64 = 250.0;

/// Floored score at which each milestone-gated kind last fired.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnCounters {
    pub orange_orb: f64,
    pub green_orb: f64,
    pub portal: f64,
    pub green_portal: f64,
}

/// True when `score` has crossed at least one multiple of `interval` since
/// `last`. Crossing several at once still yields a single spawn. `last` is
/// advanced to the floored score whether or not the spawn then succeeds.
pub fn score_gate(score: f64, last: &mut f64, interval: f64) -> bool {
    if interval <= 0.0 {
        return false;
    }
    let current = score.floor();
    let crossed = (current / interval).floor() - (*last / interval).floor();
    if crossed > 0.0 {
        *last = current;
        true
    } else {
        false
    }
}

/// One frame of endless-mode generation. Asteroids are not spawned here.
pub fn generate(
    registry: &mut EntityRegistry,
    config: &GameConfig,
    state: GameState,
    score: f64,
    counters: &mut SpawnCounters,
    rng: &mut impl Rng,
) {
    let flying = state == GameState::Flying;
    let grounded = matches!(state, GameState::Normal | GameState::UpDownMode);

    if rng.gen::<f64>() < COIN_CHANCE {
        spawn_coin(registry, config, flying, rng);
    }
    if score_gate(score, &mut counters.orange_orb, config.orb_spawn_interval) {
        spawn_orange_orb(registry, config, flying, rng);
    }
    if score_gate(score, &mut counters.green_orb, config.green_orb_spawn_interval) {
        spawn_green_orb(registry, config, flying, rng);
    }

    if grounded {
        if rng.gen::<f64>() < OBSTACLE_CHANCE {
            spawn_obstacle(registry, config);
        }
        if rng.gen::<f64>() < STAIR_CHANCE {
            spawn_stair(registry, config, rng);
        }
        if score_gate(score, &mut counters.portal, config.portal_spawn_interval) {
            spawn_portal(registry, config, false);
        }
        if score_gate(
            score,
            &mut counters.green_portal,
            config.green_portal_spawn_interval(),
        ) {
            spawn_portal(registry, config, true);
        }
    }
}

fn pick<T: Copy>(rng: &mut impl Rng, options: &[T]) -> T {
    let index = (rng.gen::<f64>() * options.len() as f64) as usize;
    options[index.min(options.len() - 1)]
}

fn overlaps_ground_hazard(registry: &EntityRegistry, candidate: &Aabb) -> bool {
    registry
        .stairs
        .iter()
        .any(|stair| boxes_overlap(candidate, &stair.bounds))
        || registry
            .obstacles
            .iter()
            .any(|obstacle| boxes_overlap(candidate, &obstacle.bounds))
}

pub fn spawn_coin(
    registry: &mut EntityRegistry,
    config: &GameConfig,
    flying: bool,
    rng: &mut impl Rng,
) -> bool {
    let y = if flying {
        30.0 + rng.gen::<f64>() * (config.canvas_height - 60.0)
    } else {
        let gh = config.ground_height;
        pick(rng, &[gh - 30.0, gh - 80.0, gh - 130.0, gh - 180.0])
    };
    let coin = Coin::new(config.canvas_width + 20.0, y, COIN_POINTS);

    let crowded = registry
        .coins
        .iter()
        .any(|existing| coin.bounds.origin_distance(&existing.bounds) < 60.0);
    let blocked = if flying {
        registry
            .asteroids
            .iter()
            .any(|asteroid| boxes_overlap(&coin.bounds, &asteroid.bounds))
    } else {
        overlaps_ground_hazard(registry, &coin.bounds)
    };
    if crowded || blocked {
        return false;
    }
    registry.coins.push(coin);
    true
}

pub fn spawn_obstacle(registry: &mut EntityRegistry, config: &GameConfig) -> bool {
    let obstacle = Obstacle::new(
        config.canvas_width + 20.0,
        config.ground_height - SPIKE_SIZE,
    );
    let x = obstacle.bounds.x;
    let blocked = registry
        .obstacles
        .iter()
        .any(|existing| (x - existing.bounds.x).abs() < 60.0)
        || registry
            .stairs
            .iter()
            .any(|stair| (x - stair.bounds.x).abs() < 80.0);
    if blocked {
        return false;
    }
    registry.obstacles.push(obstacle);
    true
}

pub fn spawn_stair(registry: &mut EntityRegistry, config: &GameConfig, rng: &mut impl Rng) -> bool {
    let width = pick(rng, &STAIR_WIDTHS);
    let height = pick(rng, &STAIR_HEIGHTS);
    let stair = Stair::new(
        config.canvas_width + 20.0,
        config.ground_height - height,
        width,
        height,
    );
    let x = stair.bounds.x;
    let min_gap = width + 40.0;
    let blocked = registry
        .stairs
        .iter()
        .any(|existing| (x - existing.bounds.x).abs() < min_gap)
        || registry
            .obstacles
            .iter()
            .any(|obstacle| (x - obstacle.bounds.x).abs() < min_gap);
    if blocked {
        return false;
    }
    registry.stairs.push(stair);
    true
}

pub fn spawn_orange_orb(
    registry: &mut EntityRegistry,
    config: &GameConfig,
    flying: bool,
    rng: &mut impl Rng,
) -> bool {
    let y = if flying {
        50.0 + rng.gen::<f64>() * (config.canvas_height - 100.0)
    } else {
        config.ground_height - 80.0 - rng.gen::<f64>() * 100.0
    };
    let orb = OrangeOrb::new(config.canvas_width + 50.0, y, ORANGE_ORB_SIZE);

    let blocked = registry
        .orange_orbs
        .iter()
        .any(|existing| orb.bounds.origin_distance(&existing.bounds) < 80.0)
        || registry
            .coins
            .iter()
            .any(|coin| orb.bounds.origin_distance(&coin.bounds) < 60.0)
        || (!flying && overlaps_ground_hazard(registry, &orb.bounds));
    if blocked {
        log::debug!("Orange orb placement rejected at y={y:.1}");
        return false;
    }
    registry.orange_orbs.push(orb);
    true
}

pub fn spawn_green_orb(
    registry: &mut EntityRegistry,
    config: &GameConfig,
    flying: bool,
    rng: &mut impl Rng,
) -> bool {
    let y = if flying {
        60.0 + rng.gen::<f64>() * (config.canvas_height - 120.0)
    } else {
        config.ground_height - 90.0 - rng.gen::<f64>() * 120.0
    };
    let orb = GreenOrb::new(config.canvas_width + 60.0, y, GREEN_ORB_SIZE);

    let blocked = registry
        .green_orbs
        .iter()
        .any(|existing| orb.bounds.origin_distance(&existing.bounds) < 100.0)
        || registry
            .orange_orbs
            .iter()
            .any(|existing| orb.bounds.origin_distance(&existing.bounds) < 80.0)
        || registry
            .coins
            .iter()
            .any(|coin| orb.bounds.origin_distance(&coin.bounds) < 70.0)
        || (!flying && overlaps_ground_hazard(registry, &orb.bounds));
    if blocked {
        log::debug!("Green orb placement rejected at y={y:.1}");
        return false;
    }
    registry.green_orbs.push(orb);
    true
}

/// Portals of either colour keep 200 units apart from each other and 120
/// from ground hazards.
pub fn spawn_portal(registry: &mut EntityRegistry, config: &GameConfig, green: bool) -> bool {
    let portal = Portal::new(
        config.canvas_width + 100.0,
        config.ground_height - 120.0,
        PORTAL_SIZE,
        PORTAL_SIZE,
    );
    let x = portal.bounds.x;
    let near = |other: &Aabb, gap: f64| (x - other.x).abs() < gap;
    let blocked = registry
        .portals
        .iter()
        .chain(registry.green_portals.iter())
        .any(|existing| near(&existing.bounds, 200.0))
        || registry.stairs.iter().any(|s| near(&s.bounds, 120.0))
        || registry.obstacles.iter().any(|o| near(&o.bounds, 120.0));
    if blocked {
        log::debug!("Portal placement rejected (green={green})");
        return false;
    }
    if green {
        registry.green_portals.push(portal);
    } else {
        registry.portals.push(portal);
    }
    true
}

/// Spawns once the newest asteroid has drifted far enough left. Vertical
/// placement favours the middle band: 25% top, 50% middle, 25% bottom.
pub fn spawn_asteroid(
    registry: &mut EntityRegistry,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> bool {
    let spaced = registry
        .asteroids
        .last()
        .map_or(true, |newest| {
            newest.bounds.x < config.canvas_width - ASTEROID_SPACING
        });
    if !spaced {
        return false;
    }

    let height = config.canvas_height;
    let size = pick(rng, &ASTEROID_SIZES);
    let zone = rng.gen::<f64>();
    let raw_y = if zone < 0.25 {
        rng.gen::<f64>() * height * 0.33
    } else if zone < 0.75 {
        rng.gen::<f64>() * height * 0.34 + height * 0.33
    } else {
        rng.gen::<f64>() * height * 0.33 + height * 0.67
    };
    let clearance = size / 2.0 + 10.0;
    let y = raw_y.max(clearance).min(height - clearance);
    let x = config.canvas_width + rng.gen::<f64>() * 100.0;
    let rotation_speed = (rng.gen::<f64>() - 0.5) * 0.1;
    let asteroid = Asteroid::new(x, y, size, rotation_speed);

    let blocked = registry.asteroids.iter().any(|existing| {
        let min_distance = (asteroid.bounds.width + existing.bounds.width) / 2.0 + 20.0;
        asteroid.bounds.origin_distance(&existing.bounds) < min_distance
    });
    if blocked {
        return false;
    }
    registry.asteroids.push(asteroid);
    true
}
