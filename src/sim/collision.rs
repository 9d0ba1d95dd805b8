//! Collision rules
//!
//! Both checks only look at the horizontal distance once a meteor is inside
//! the relevant vertical band. The bands are deliberately asymmetric:
//! the character's hit window is `(-CHARACTER_SIZE, spawn_size)` while the
//! spawn-overlap window is `(-spawn_size, spawn_size)`.

use super::state::{Meteor, MeteorPool};
use crate::consts::{CHARACTER_SIZE, FIELD_HEIGHT};

/// Lowest y (exclusive) at which a meteor can reach the character's row
pub fn hit_band_top(spawn_size: i32) -> i32 {
    FIELD_HEIGHT - (spawn_size + 31)
}

/// Does `meteor` hit a character standing at column `character_x`?
pub fn meteor_hits_character(meteor: &Meteor, character_x: i32, spawn_size: i32) -> bool {
    if meteor.rect.y <= hit_band_top(spawn_size) {
        return false;
    }
    // Widened: a request may place the character anywhere in i32
    let dx = i64::from(character_x) - i64::from(meteor.rect.x);
    dx > -i64::from(CHARACTER_SIZE) && dx < i64::from(spawn_size)
}

/// First meteor (in spawn order) that hits the character, if any
pub fn character_hit(pool: &MeteorPool, character_x: i32, spawn_size: i32) -> Option<&Meteor> {
    pool.iter()
        .find(|m| meteor_hits_character(m, character_x, spawn_size))
}

/// Would a meteor spawned at `spawn_x` overlap one still near the top?
pub fn spawn_blocked(pool: &MeteorPool, spawn_x: i32, spawn_size: i32) -> bool {
    pool.iter().any(|m| {
        let dx = i64::from(spawn_x) - i64::from(m.rect.x);
        let size = i64::from(spawn_size);
        m.rect.y < spawn_size && dx > -size && dx < size
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_SPAWN_SIZE;
    use crate::sim::palette::Color;
    use crate::sim::state::Rect;

    fn pool_with(meteors: &[(i32, i32)]) -> MeteorPool {
        let mut pool = MeteorPool::new().unwrap();
        for &(x, y) in meteors {
            pool.spawn(Rect::new(x, y, DEFAULT_SPAWN_SIZE, DEFAULT_SPAWN_SIZE), Color::Red)
                .unwrap();
        }
        pool
    }

    #[test]
    fn test_hit_inside_window() {
        // dx = 300 - 310 = -10, inside (-20, 75)
        let pool = pool_with(&[(310, 260)]);
        assert!(character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).is_some());
    }

    #[test]
    fn test_miss_outside_window() {
        // dx = -100
        let pool = pool_with(&[(400, 260)]);
        assert!(character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).is_none());
    }

    #[test]
    fn test_window_edges_are_exclusive() {
        // dx == -20 and dx == spawn_size both miss
        let pool = pool_with(&[(320, 260), (225, 260)]);
        assert!(character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).is_none());
        let pool = pool_with(&[(319, 260)]);
        assert!(character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).is_some());
    }

    #[test]
    fn test_meteor_above_band_is_ignored() {
        // Band starts strictly below 280 - (75 + 31) = 174
        let pool = pool_with(&[(300, 174)]);
        assert!(character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).is_none());
        let pool = pool_with(&[(300, 175)]);
        assert!(character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).is_some());
    }

    #[test]
    fn test_first_hit_wins() {
        let pool = pool_with(&[(500, 260), (290, 200), (295, 250)]);
        let hit = character_hit(&pool, 300, DEFAULT_SPAWN_SIZE).unwrap();
        assert_eq!(hit.rect.x, 290);
    }

    #[test]
    fn test_spawn_overlap() {
        let pool = pool_with(&[(100, 10)]);
        assert!(spawn_blocked(&pool, 150, DEFAULT_SPAWN_SIZE));
        assert!(spawn_blocked(&pool, 26, DEFAULT_SPAWN_SIZE));
        assert!(!spawn_blocked(&pool, 175, DEFAULT_SPAWN_SIZE));
        assert!(!spawn_blocked(&pool, 25, DEFAULT_SPAWN_SIZE));
    }

    #[test]
    fn test_spawn_not_blocked_once_meteor_falls() {
        let pool = pool_with(&[(100, DEFAULT_SPAWN_SIZE)]);
        assert!(!spawn_blocked(&pool, 100, DEFAULT_SPAWN_SIZE));
    }
}
