//! Per-step collision resolution between projectiles and combatants.
//!
//! Plain sphere-distance checks against a per-target-type radius; the
//! owner enum filters eligibility exhaustively, so an impossible pairing
//! (a boss shot hitting the boss) cannot compile into existence. A
//! projectile resolves against at most one target per step, boss before
//! minions. Only the damage, disposal and scoring happen here; visual
//! feedback and chance drops are queued by the session for the next drain.

use engine_core::{Health, Position, Vec3, World};

use crate::boss::Boss;
use crate::combo::ComboTracker;
use crate::minion::Minion;
use crate::player::Player;
use crate::projectile::{Owner, ProjectileSet};
use crate::score::ScoreBoard;
use crate::visuals::VisualPools;

pub const BOSS_HIT_RADIUS: f32 = 2.2;
pub const MINION_HIT_RADIUS: f32 = 1.0;
pub const PLAYER_HIT_RADIUS: f32 = 0.9;

pub const BOSS_HIT_SCORE: u32 = 100;
pub const MINION_HIT_SCORE: u32 = 25;
pub const MINION_KILL_SCORE: u32 = 75;

/// One resolved hit, reported back to the session so it can queue the
/// deferred feedback (burst, chance drop, despawn).
#[derive(Debug, Clone, Copy)]
pub enum Strike {
    Boss { position: Vec3, defeated: bool },
    Minion { position: Vec3, defeated: bool },
    Player { position: Vec3, defeated: bool },
}

/// Resolve every live projectile against its eligible targets. Hits
/// dispose the projectile and, for player-scoring hits, feed the combo
/// tracker and score. A missing boss or an empty minion world simply
/// yields no hits.
#[allow(clippy::too_many_arguments)]
pub fn resolve(
    projectiles: &mut ProjectileSet,
    pools: &mut VisualPools,
    player: &mut Player,
    mut boss: Option<&mut Boss>,
    minions: &mut World,
    combo: &mut ComboTracker,
    score: &mut ScoreBoard,
    now: f64,
) -> Vec<Strike> {
    let mut strikes = Vec::new();
    let mut i = 0;
    while i < projectiles.active() {
        let Some(p) = projectiles.get(i) else { break };
        let (position, owner, damage) = (p.position, p.owner, p.damage);

        let strike = match owner {
            Owner::Player => resolve_player_shot(position, damage, boss.as_deref_mut(), minions),
            Owner::Boss | Owner::Minion => resolve_hostile_shot(position, damage, player),
        };

        match strike {
            Some(strike) => {
                if let Some(base) = scoring_base(&strike) {
                    let multiplier = combo.register_hit(now);
                    let points = score.award(base, multiplier);
                    log::trace!("hit scored {points} (x{multiplier})");
                }
                projectiles.dispose_at(i, pools);
                strikes.push(strike);
            }
            None => i += 1,
        }
    }
    strikes
}

/// Base score for a strike, `None` when the hit doesn't score (the player
/// being hit never feeds the combo).
fn scoring_base(strike: &Strike) -> Option<u32> {
    match strike {
        Strike::Boss { .. } => Some(BOSS_HIT_SCORE),
        Strike::Minion { defeated: true, .. } => Some(MINION_KILL_SCORE),
        Strike::Minion { .. } => Some(MINION_HIT_SCORE),
        Strike::Player { .. } => None,
    }
}

/// Boss is checked before minions: a shot that could hit both lands on
/// the headline target.
fn resolve_player_shot(
    position: Vec3,
    damage: f32,
    boss: Option<&mut Boss>,
    minions: &mut World,
) -> Option<Strike> {
    if let Some(boss) = boss {
        if !boss.is_defeated() && boss.position.distance(position) <= BOSS_HIT_RADIUS {
            let defeated = boss.take_damage(damage);
            return Some(Strike::Boss { position, defeated });
        }
    }
    for (_, (pos, health, _)) in minions.query_mut::<(&Position, &mut Health, &Minion)>() {
        if health.is_defeated() {
            continue;
        }
        if pos.0.distance(position) <= MINION_HIT_RADIUS {
            let defeated = health.take_damage(damage);
            return Some(Strike::Minion {
                position: pos.0,
                defeated,
            });
        }
    }
    None
}

fn resolve_hostile_shot(position: Vec3, damage: f32, player: &mut Player) -> Option<Strike> {
    if !player.is_alive() {
        return None;
    }
    if player.position.distance(position) > PLAYER_HIT_RADIUS {
        return None;
    }
    let defeated = player.take_damage(damage);
    Some(Strike::Player { position, defeated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minion::spawn_minion;
    use crate::projectile::Projectile;
    use crate::visuals::VisualKind;
    use engine_core::Lifetime;
    use rand::prelude::*;

    struct Fixture {
        projectiles: ProjectileSet,
        pools: VisualPools,
        player: Player,
        minions: World,
        combo: ComboTracker,
        score: ScoreBoard,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                projectiles: ProjectileSet::new(100, None),
                pools: VisualPools::new(128, 16, 16),
                player: Player::new(Vec3::new(0.0, 1.0, -10.0), 100.0),
                minions: World::new(),
                combo: ComboTracker::new(1.2),
                score: ScoreBoard::load(std::env::temp_dir().join(format!(
                    "voidreign-combat-{}.ron",
                    std::process::id()
                ))),
            }
        }

        fn shoot(&mut self, owner: Owner, position: Vec3, damage: f32) {
            let p = Projectile {
                position,
                velocity: Vec3::ZERO,
                damage,
                owner,
                lifetime: Lifetime::new(5.0),
                visual: self.pools.acquire(VisualKind::Projectile),
            };
            self.projectiles.try_spawn(p, &mut self.pools);
        }

        fn resolve(&mut self, boss: Option<&mut Boss>, now: f64) -> Vec<Strike> {
            resolve(
                &mut self.projectiles,
                &mut self.pools,
                &mut self.player,
                boss,
                &mut self.minions,
                &mut self.combo,
                &mut self.score,
                now,
            )
        }
    }

    fn boss_at(position: Vec3, health: f32) -> Boss {
        let mut boss = Boss::new(health);
        boss.position = position;
        boss
    }

    #[test]
    fn player_shot_damages_boss_and_scores() {
        let mut fx = Fixture::new();
        let mut boss = boss_at(Vec3::new(0.0, 3.0, 5.0), 500.0);
        fx.shoot(Owner::Player, Vec3::new(0.0, 3.0, 5.5), 12.0);

        let strikes = fx.resolve(Some(&mut boss), 0.0);
        assert_eq!(strikes.len(), 1);
        assert!(matches!(strikes[0], Strike::Boss { defeated: false, .. }));
        assert_eq!(boss.health.current, 488.0);
        assert_eq!(fx.score.score(), u64::from(BOSS_HIT_SCORE));
        assert_eq!(fx.projectiles.active(), 0);
    }

    #[test]
    fn boss_is_checked_before_minions() {
        let mut fx = Fixture::new();
        let spot = Vec3::new(2.0, 1.0, 2.0);
        let mut boss = boss_at(spot, 500.0);
        let mut rng = StdRng::seed_from_u64(1);
        let entity = spawn_minion(&mut fx.minions, spot, &mut rng);
        fx.shoot(Owner::Player, spot, 10.0);

        let strikes = fx.resolve(Some(&mut boss), 0.0);
        assert!(matches!(strikes[0], Strike::Boss { .. }));
        // Minion untouched.
        let health = fx.minions.get::<&Health>(entity).expect("minion exists");
        assert_eq!(health.current, health.max);
    }

    #[test]
    fn one_projectile_hits_at_most_one_minion() {
        let mut fx = Fixture::new();
        let spot = Vec3::new(4.0, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(2);
        spawn_minion(&mut fx.minions, spot, &mut rng);
        spawn_minion(&mut fx.minions, spot, &mut rng);
        fx.shoot(Owner::Player, spot, 10.0);

        let strikes = fx.resolve(None, 0.0);
        assert_eq!(strikes.len(), 1);
        let damaged = fx
            .minions
            .query_mut::<&Health>()
            .into_iter()
            .filter(|(_, h)| h.current < h.max)
            .count();
        assert_eq!(damaged, 1);
    }

    #[test]
    fn hostile_shot_hits_the_player() {
        let mut fx = Fixture::new();
        let at = fx.player.position;
        fx.shoot(Owner::Minion, at, 5.0);
        fx.shoot(Owner::Boss, at, 8.0);

        let strikes = fx.resolve(None, 0.0);
        assert_eq!(strikes.len(), 2);
        assert_eq!(fx.player.health.current, 87.0);
        // Being hit never feeds the combo.
        assert_eq!(fx.combo.multiplier(), 1);
        assert_eq!(fx.score.score(), 0);
    }

    #[test]
    fn player_shots_pass_through_the_player() {
        let mut fx = Fixture::new();
        fx.shoot(Owner::Player, fx.player.position, 50.0);
        let strikes = fx.resolve(None, 0.0);
        assert!(strikes.is_empty());
        assert_eq!(fx.player.health.current, 100.0);
        assert_eq!(fx.projectiles.active(), 1);
    }

    #[test]
    fn missing_boss_and_empty_world_is_a_noop() {
        let mut fx = Fixture::new();
        fx.shoot(Owner::Player, Vec3::new(3.0, 1.0, 3.0), 10.0);
        let strikes = fx.resolve(None, 0.0);
        assert!(strikes.is_empty());
        assert_eq!(fx.projectiles.active(), 1);
    }

    #[test]
    fn combo_multiplies_consecutive_hit_scores() {
        let mut fx = Fixture::new();
        let mut boss = boss_at(Vec3::new(0.0, 3.0, 5.0), 500.0);
        fx.shoot(Owner::Player, boss.position, 10.0);
        fx.resolve(Some(&mut boss), 0.0);
        fx.shoot(Owner::Player, boss.position, 10.0);
        fx.resolve(Some(&mut boss), 0.5);
        // First hit x1, second inside the window x2.
        assert_eq!(fx.score.score(), u64::from(BOSS_HIT_SCORE) * 3);
        assert_eq!(fx.combo.multiplier(), 2);
    }

    #[test]
    fn minion_kill_scores_more_than_a_graze() {
        let mut fx = Fixture::new();
        let spot = Vec3::new(4.0, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        spawn_minion(&mut fx.minions, spot, &mut rng);
        fx.shoot(Owner::Player, spot, crate::minion::MINION_HEALTH + 1.0);

        let strikes = fx.resolve(None, 0.0);
        assert!(matches!(strikes[0], Strike::Minion { defeated: true, .. }));
        assert_eq!(fx.score.score(), u64::from(MINION_KILL_SCORE));
    }

    #[test]
    fn defeated_minions_are_transparent_to_shots() {
        let mut fx = Fixture::new();
        let spot = Vec3::new(4.0, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(4);
        let entity = spawn_minion(&mut fx.minions, spot, &mut rng);
        if let Ok(mut health) = fx.minions.get::<&mut Health>(entity) {
            health.take_damage(1000.0);
        }
        fx.shoot(Owner::Player, spot, 10.0);
        let strikes = fx.resolve(None, 0.0);
        assert!(strikes.is_empty());
        assert_eq!(fx.projectiles.active(), 1);
    }

    #[test]
    fn shielded_player_consumes_shield_not_health() {
        let mut fx = Fixture::new();
        fx.player.apply_drop(crate::drops::DropKind::Shield);
        fx.shoot(Owner::Boss, fx.player.position, 40.0);
        let strikes = fx.resolve(None, 0.0);
        // The projectile is still consumed by the hit.
        assert_eq!(strikes.len(), 1);
        assert_eq!(fx.projectiles.active(), 0);
        assert_eq!(fx.player.health.current, 100.0);
        assert!(!fx.player.is_shielded());
    }
}
