use crate::config::textures;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulletType {
    #[default]
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsteroidType {
    #[default]
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Ship,
    Bullet(BulletType),
    Asteroid(AsteroidType),
}

impl ObjectKind {
    pub fn texture_name(&self) -> &'static str {
        match self {
            ObjectKind::Ship => textures::SHIP,
            ObjectKind::Bullet(_) => textures::BULLET,
            ObjectKind::Asteroid(_) => textures::ASTEROID,
        }
    }

    /// The ship texture points down; turn it to face up the screen.
    pub fn initial_rotation(&self) -> f64 {
        match self {
            ObjectKind::Ship => PI,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_a_manifest_texture() {
        assert_eq!(ObjectKind::Ship.texture_name(), "ship");
        assert_eq!(ObjectKind::Bullet(BulletType::Double).texture_name(), "bullet");
        assert_eq!(
            ObjectKind::Asteroid(AsteroidType::default()).texture_name(),
            "asteroid"
        );
    }

    #[test]
    fn only_the_ship_starts_rotated() {
        assert_eq!(ObjectKind::Ship.initial_rotation(), PI);
        assert_eq!(ObjectKind::Bullet(BulletType::Single).initial_rotation(), 0.0);
        assert_eq!(BulletType::default(), BulletType::Single);
    }
}
