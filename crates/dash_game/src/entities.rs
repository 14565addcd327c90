//! World entities and the registry that owns them.
//!
//! Every entity kind lives in its own typed container. Each frame all of them
//! scroll left by the same speed and are dropped once fully off-screen, so the
//! player never moves horizontally and the world moves past it instead.

use glam::DVec2;
use rand::Rng;

use crate::collision::Aabb;

pub const COIN_SIZE: f64 = 20.0;
pub const COIN_POINTS: i64 = 10;
pub const SPIKE_SIZE: f64 = 20.0;
pub const PORTAL_SIZE: f64 = 80.0;
pub const ORANGE_ORB_SIZE: f64 = 25.0;
pub const GREEN_ORB_SIZE: f64 = 30.0;

const SPARKLE_PARTICLES: usize = 8;
const SPARKLE_LIFETIME_MS: f64 = 1000.0;
const PARTICLE_DECAY: f64 = 0.02;
const PARTICLE_DAMPING: f64 = 0.98;

/// Anything that scrolls with the world.
pub trait Scrolling {
    fn bounds(&self) -> &Aabb;
    fn bounds_mut(&mut self) -> &mut Aabb;

    /// Per-frame cosmetic animation (spin, pulse).
    fn animate(&mut self) {}
}

/// Moves every item left by `speed`, then drops those whose right edge is at
/// or past the left screen edge.
pub fn scroll_and_prune<T: Scrolling>(items: &mut Vec<T>, speed: f64) {
    for item in items.iter_mut() {
        item.bounds_mut().x -= speed;
        item.animate();
    }
    items.retain(|item| item.bounds().right() > 0.0);
}

macro_rules! impl_scrolling {
    ($ty:ty) => {
        impl Scrolling for $ty {
            fn bounds(&self) -> &Aabb {
                &self.bounds
            }
            fn bounds_mut(&mut self) -> &mut Aabb {
                &mut self.bounds
            }
        }
    };
    ($ty:ty, |$this:ident| $body:block) => {
        impl Scrolling for $ty {
            fn bounds(&self) -> &Aabb {
                &self.bounds
            }
            fn bounds_mut(&mut self) -> &mut Aabb {
                &mut self.bounds
            }
            fn animate(&mut self) {
                let $this = self;
                $body
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub bounds: Aabb,
    pub points: i64,
    pub rotation: f64,
    pub collected: bool,
}

impl Coin {
    pub fn new(x: f64, y: f64, points: i64) -> Self {
        Self {
            bounds: Aabb::square(x, y, COIN_SIZE),
            points,
            rotation: 0.0,
            collected: false,
        }
    }
}

impl_scrolling!(Coin, |coin| {
    coin.rotation += 0.1;
});

/// Ground spike. Fatal on contact unless invincible.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub bounds: Aabb,
}

impl Obstacle {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            bounds: Aabb::square(x, y, SPIKE_SIZE),
        }
    }
}

impl_scrolling!(Obstacle);

/// Platform the player can land on; hitting its side is fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct Stair {
    pub bounds: Aabb,
}

impl Stair {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            bounds: Aabb::new(x, y, width, height),
        }
    }
}

impl_scrolling!(Stair);

/// Used for both portal colours; the registry keeps them in separate lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub bounds: Aabb,
    pub rotation: f64,
    pub entered: bool,
}

impl Portal {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            bounds: Aabb::new(x, y, width, height),
            rotation: 0.0,
            entered: false,
        }
    }
}

impl_scrolling!(Portal, |portal| {
    portal.rotation += 0.1;
});

#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub bounds: Aabb,
    pub rotation: f64,
    pub rotation_speed: f64,
    /// The near-miss bonus is paid once per asteroid.
    pub bonus_awarded: bool,
}

impl Asteroid {
    pub fn new(x: f64, y: f64, size: f64, rotation_speed: f64) -> Self {
        Self {
            bounds: Aabb::square(x, y, size),
            rotation: 0.0,
            rotation_speed,
            bonus_awarded: false,
        }
    }
}

impl_scrolling!(Asteroid, |asteroid| {
    asteroid.rotation += asteroid.rotation_speed;
});

#[derive(Debug, Clone, PartialEq)]
pub struct CeilingSpike {
    pub bounds: Aabb,
}

impl CeilingSpike {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            bounds: Aabb::new(x, y, width, height),
        }
    }
}

impl_scrolling!(CeilingSpike);

#[derive(Debug, Clone, PartialEq)]
pub struct OrangeOrb {
    pub bounds: Aabb,
    pub rotation: f64,
    pub pulse: f64,
    pub collected: bool,
}

impl OrangeOrb {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self {
            bounds: Aabb::square(x, y, size),
            rotation: 0.0,
            pulse: 0.0,
            collected: false,
        }
    }
}

impl_scrolling!(OrangeOrb, |orb| {
    orb.rotation += 0.05;
    orb.pulse += 0.1;
});

#[derive(Debug, Clone, PartialEq)]
pub struct GreenOrb {
    pub bounds: Aabb,
    pub rotation: f64,
    pub pulse: f64,
    pub sparkle: f64,
    pub collected: bool,
}

impl GreenOrb {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self {
            bounds: Aabb::square(x, y, size),
            rotation: 0.0,
            pulse: 0.0,
            sparkle: 0.0,
            collected: false,
        }
    }
}

impl_scrolling!(GreenOrb, |orb| {
    orb.rotation += 0.08;
    orb.pulse += 0.15;
    orb.sparkle += 0.2;
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    pub life: f64,
    pub decay: f64,
}

/// Radial burst shown when a coin is picked up.
#[derive(Debug, Clone, PartialEq)]
pub struct SparkleBurst {
    pub origin: DVec2,
    pub particles: Vec<Particle>,
    pub timer_ms: f64,
    pub max_timer_ms: f64,
}

impl SparkleBurst {
    pub fn new(origin: DVec2, rng: &mut impl Rng) -> Self {
        let particles = (0..SPARKLE_PARTICLES)
            .map(|i| {
                let angle = (i as f64 / SPARKLE_PARTICLES as f64) * std::f64::consts::TAU;
                let speed = 2.0 + rng.gen::<f64>() * 3.0;
                Particle {
                    position: origin,
                    velocity: DVec2::from_angle(angle) * speed,
                    life: 1.0,
                    decay: PARTICLE_DECAY,
                }
            })
            .collect();
        Self {
            origin,
            particles,
            timer_ms: 0.0,
            max_timer_ms: SPARKLE_LIFETIME_MS,
        }
    }

    pub fn update(&mut self, frame_ms: f64) {
        self.timer_ms += frame_ms;
        for particle in &mut self.particles {
            particle.position += particle.velocity;
            particle.life -= particle.decay;
            particle.velocity *= PARTICLE_DAMPING;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn is_alive(&self) -> bool {
        self.timer_ms < self.max_timer_ms && !self.particles.is_empty()
    }
}

/// Floating score text ("+2", "LEVEL COMPLETE! +500").
#[derive(Debug, Clone, PartialEq)]
pub struct BonusNotification {
    pub text: String,
    pub position: DVec2,
    pub timer_ms: f64,
    pub max_timer_ms: f64,
}

impl BonusNotification {
    pub fn update(&mut self, frame_ms: f64) {
        self.timer_ms += frame_ms;
        self.position.y -= 1.0;
    }

    pub fn is_alive(&self) -> bool {
        self.timer_ms < self.max_timer_ms
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    pub coins: Vec<Coin>,
    pub obstacles: Vec<Obstacle>,
    pub stairs: Vec<Stair>,
    pub portals: Vec<Portal>,
    pub green_portals: Vec<Portal>,
    pub asteroids: Vec<Asteroid>,
    pub ceiling_spikes: Vec<CeilingSpike>,
    pub orange_orbs: Vec<OrangeOrb>,
    pub green_orbs: Vec<GreenOrb>,
    pub sparkles: Vec<SparkleBurst>,
    pub notifications: Vec<BonusNotification>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Scroll every world entity and age the effects.
    pub fn update(&mut self, scroll_speed: f64, frame_ms: f64) {
        scroll_and_prune(&mut self.coins, scroll_speed);
        scroll_and_prune(&mut self.obstacles, scroll_speed);
        scroll_and_prune(&mut self.stairs, scroll_speed);
        scroll_and_prune(&mut self.portals, scroll_speed);
        scroll_and_prune(&mut self.green_portals, scroll_speed);
        scroll_and_prune(&mut self.asteroids, scroll_speed);
        scroll_and_prune(&mut self.ceiling_spikes, scroll_speed);
        scroll_and_prune(&mut self.orange_orbs, scroll_speed);
        scroll_and_prune(&mut self.green_orbs, scroll_speed);

        for burst in &mut self.sparkles {
            burst.update(frame_ms);
        }
        self.sparkles.retain(SparkleBurst::is_alive);

        for notification in &mut self.notifications {
            notification.update(frame_ms);
        }
        self.notifications.retain(BonusNotification::is_alive);
    }

    pub fn notify(&mut self, text: impl Into<String>, position: DVec2, duration_ms: f64) {
        self.notifications.push(BonusNotification {
            text: text.into(),
            position,
            timer_ms: 0.0,
            max_timer_ms: duration_ms,
        });
    }

    pub fn burst(&mut self, origin: DVec2, rng: &mut impl Rng) {
        self.sparkles.push(SparkleBurst::new(origin, rng));
    }

    /// Re-seat grounded entities after the ground line moved.
    pub fn reseat_on_ground(&mut self, ground_height: f64) {
        for obstacle in &mut self.obstacles {
            obstacle.bounds.y = ground_height - obstacle.bounds.height;
        }
        for stair in &mut self.stairs {
            stair.bounds.y = ground_height - stair.bounds.height;
        }
        for coin in &mut self.coins {
            coin.bounds.y = (ground_height - 80.0).max(50.0);
        }
    }

    /// Number of world entities, effects excluded.
    pub fn world_entity_count(&self) -> usize {
        self.coins.len()
            + self.obstacles.len()
            + self.stairs.len()
            + self.portals.len()
            + self.green_portals.len()
            + self.asteroids.len()
            + self.ceiling_spikes.len()
            + self.orange_orbs.len()
            + self.green_orbs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scroll_moves_every_kind_by_speed() {
        let mut registry = EntityRegistry::new();
        registry.coins.push(Coin::new(400.0, 300.0, COIN_POINTS));
        registry.obstacles.push(Obstacle::new(400.0, 330.0));
        registry.stairs.push(Stair::new(400.0, 300.0, 60.0, 50.0));
        registry.portals.push(Portal::new(400.0, 230.0, 80.0, 80.0));
        registry.green_portals.push(Portal::new(400.0, 230.0, 80.0, 80.0));
        registry.asteroids.push(Asteroid::new(400.0, 200.0, 50.0, 0.05));
        registry.ceiling_spikes.push(CeilingSpike::new(400.0, 30.0, 20.0, 20.0));
        registry.orange_orbs.push(OrangeOrb::new(400.0, 270.0, 25.0));
        registry.green_orbs.push(GreenOrb::new(400.0, 260.0, 30.0));

        registry.update(5.0, 16.0);

        assert_eq!(registry.coins[0].bounds.x, 395.0);
        assert_eq!(registry.obstacles[0].bounds.x, 395.0);
        assert_eq!(registry.stairs[0].bounds.x, 395.0);
        assert_eq!(registry.portals[0].bounds.x, 395.0);
        assert_eq!(registry.green_portals[0].bounds.x, 395.0);
        assert_eq!(registry.asteroids[0].bounds.x, 395.0);
        assert_eq!(registry.ceiling_spikes[0].bounds.x, 395.0);
        assert_eq!(registry.orange_orbs[0].bounds.x, 395.0);
        assert_eq!(registry.green_orbs[0].bounds.x, 395.0);
        assert!((registry.asteroids[0].rotation - 0.05).abs() < 1e-12);
    }

    #[test]
    fn entity_is_pruned_exactly_when_right_edge_reaches_zero() {
        let mut coins = vec![Coin::new(-10.0, 0.0, COIN_POINTS)];
        // Right edge at 10, then 5, then 0.
        scroll_and_prune(&mut coins, 5.0);
        assert_eq!(coins.len(), 1);
        scroll_and_prune(&mut coins, 5.0);
        assert!(coins.is_empty());
    }

    #[test]
    fn collected_coins_still_scroll_until_offscreen() {
        let mut registry = EntityRegistry::new();
        let mut coin = Coin::new(100.0, 300.0, COIN_POINTS);
        coin.collected = true;
        registry.coins.push(coin);
        registry.update(5.0, 16.0);
        assert_eq!(registry.coins.len(), 1);
        assert!(registry.coins[0].collected);
    }

    #[test]
    fn sparkle_burst_expires() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut registry = EntityRegistry::new();
        registry.burst(DVec2::new(110.0, 310.0), &mut rng);
        assert_eq!(registry.sparkles[0].particles.len(), 8);
        for particle in &registry.sparkles[0].particles {
            let speed = particle.velocity.length();
            assert!((2.0..5.0).contains(&speed));
        }

        registry.update(5.0, 16.0);
        let first = registry.sparkles[0].particles[0];
        assert!((first.life - 0.98).abs() < 1e-12);

        for _ in 0..60 {
            registry.update(5.0, 16.0);
        }
        assert!(registry.sparkles.is_empty());
    }

    #[test]
    fn notification_floats_up_and_expires() {
        let mut registry = EntityRegistry::new();
        registry.notify("+2", DVec2::new(300.0, 200.0), 1000.0);
        registry.update(5.0, 16.0);
        assert_eq!(registry.notifications[0].position.y, 199.0);
        // Not scrolled with the world.
        assert_eq!(registry.notifications[0].position.x, 300.0);
        for _ in 0..62 {
            registry.update(5.0, 16.0);
        }
        assert!(registry.notifications.is_empty());
    }

    #[test]
    fn reseat_moves_grounded_entities_only_vertically() {
        let mut registry = EntityRegistry::new();
        registry.obstacles.push(Obstacle::new(500.0, 330.0));
        registry.stairs.push(Stair::new(600.0, 280.0, 60.0, 70.0));
        registry.coins.push(Coin::new(700.0, 170.0, COIN_POINTS));
        registry.reseat_on_ground(700.0);
        assert_eq!(registry.obstacles[0].bounds.y, 680.0);
        assert_eq!(registry.stairs[0].bounds.y, 630.0);
        assert_eq!(registry.coins[0].bounds.y, 620.0);
        assert_eq!(registry.coins[0].bounds.x, 700.0);

        registry.reseat_on_ground(100.0);
        assert_eq!(registry.coins[0].bounds.y, 50.0);
    }
}
