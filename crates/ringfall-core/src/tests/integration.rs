//! End-to-end arena scenarios.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;

use super::helpers::*;
use crate::{
    ArenaEvent, AttackOutcome, ConfigError, Entity, EntityKind, HazardConfig, HazardTicker,
    ItemCategory, ItemKind, Plane, ReloadOutcome, WeaponKind,
};

fn trajectories(events: &[ArenaEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ArenaEvent::Trajectory { .. }))
        .count()
}

mod construction {
    use super::*;

    #[test]
    fn player_overlapping_a_wall_is_rejected() {
        let blocker = wall(10, Vec2::new(500.0, 500.0), Vec2::new(200.0, 20.0));
        let player = bare_player(1, Vec2::new(500.0, 505.0));
        let sink = Arc::new(crate::CollectingSink::new());
        let result = crate::Arena::new(
            quiet_config(),
            vec![player],
            vec![blocker],
            vec![],
            Arc::new(crate::IdAllocator::new()),
            sink,
        );
        assert_eq!(
            result.err(),
            Some(ConfigError::SpawnObstructed { id: 1.into() })
        );
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let mut config = quiet_config();
        config.width = 0.0;
        let result = crate::Arena::new(
            config,
            vec![],
            vec![],
            vec![],
            Arc::new(crate::IdAllocator::new()),
            Arc::new(crate::NullSink),
        );
        assert!(matches!(
            result.err(),
            Some(ConfigError::InvalidDimensions { .. })
        ));
    }
}

mod movement {
    use super::*;

    #[test]
    fn wall_blocks_the_step() {
        let player = bare_player(1, Vec2::new(500.0, 520.0));
        let world = build_world(
            quiet_config(),
            vec![player.clone()],
            vec![wall(10, Vec2::new(500.0, 500.0), Vec2::new(200.0, 20.0))],
            vec![],
        );

        // Southward into the wall: rejected, position untouched.
        assert!(!world.arena.move_player(&player, 0.0, -1.0));
        assert_eq!(player.read().pos, Vec2::new(500.0, 520.0));

        // Away from the wall: applied at the full step length.
        assert!(world.arena.move_player(&player, 0.0, 1.0));
        assert_eq!(player.read().pos, Vec2::new(500.0, 524.0));
    }

    #[test]
    fn over_unit_requests_are_rejected() {
        let player = bare_player(1, Vec2::new(500.0, 500.0));
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        assert!(!world.arena.move_player(&player, 1.0, 1.0));
        assert!(!world.arena.move_player(&player, 0.0, -1.5));
        // An L1-unit diagonal sits within the tolerance.
        assert!(world.arena.move_player(&player, 0.5, 0.5));
    }

    #[test]
    fn moves_stay_inside_the_arena() {
        let player = bare_player(1, Vec2::new(9.0, 9.0));
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        for _ in 0..10 {
            world.arena.move_player(&player, -1.0, 0.0);
        }
        // Clamped at half the extent from the edge.
        assert_eq!(player.read().pos.x, 8.0);
    }

    #[test]
    fn relocation_keeps_the_player_queryable() {
        let player = bare_player(1, Vec2::new(100.0, 100.0));
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        for _ in 0..100 {
            assert!(world.arena.move_player(&player, 1.0, 0.0));
        }
        let pos = player.read().pos;
        assert_eq!(pos, Vec2::new(500.0, 100.0));

        let visible = world.arena.within_window(pos.x, pos.y, 100.0, 100.0);
        assert!(visible.iter().any(|h| Arc::ptr_eq(h, &player)));
        // The starting location is empty now.
        assert!(world
            .arena
            .within_window(100.0, 100.0, 100.0, 100.0)
            .is_empty());
    }

    #[test]
    fn dead_players_cannot_move() {
        let player = bare_player(1, Vec2::new(500.0, 500.0));
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        player.write().apply_damage(10_000.0);
        assert!(!world.arena.move_player(&player, 0.0, 1.0));
    }

    #[test]
    fn pace_slows_outside_the_safe_circle() {
        let mut config = quiet_config();
        config.hazard = HazardConfig {
            center: Vec2::new(500.0, 500.0),
            initial_diameter: 200.0,
            floor_diameter: 200.0,
            outside_pace: 0.5,
            ..HazardConfig::default()
        };
        let inside = bare_player(1, Vec2::new(500.0, 500.0));
        let outside = bare_player(2, Vec2::new(900.0, 500.0));
        let world = build_world(config, vec![inside.clone(), outside.clone()], vec![], vec![]);

        assert!(world.arena.move_player(&inside, 1.0, 0.0));
        assert!(world.arena.move_player(&outside, 1.0, 0.0));
        assert_eq!(inside.read().pos.x, 504.0);
        assert_eq!(outside.read().pos.x, 902.0);
    }
}

mod visibility {
    use super::*;

    #[test]
    fn window_filtering_is_exact() {
        let player = bare_player(1, Vec2::new(100.0, 100.0));
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        // Bounds are 92..108; a 60x60 window centered at (150, 100) spans
        // x 120..180 and misses even though the grid candidate set is
        // coarser than the window.
        assert!(world.arena.within_window(150.0, 100.0, 60.0, 60.0).is_empty());
        assert_eq!(world.arena.within_window(120.0, 100.0, 60.0, 60.0).len(), 1);
    }

    #[test]
    fn dead_entities_are_invisible() {
        let player = bare_player(1, Vec2::new(100.0, 100.0));
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        assert_eq!(world.arena.within_window(100.0, 100.0, 200.0, 200.0).len(), 1);
        player.write().apply_damage(10_000.0);
        assert!(world.arena.within_window(100.0, 100.0, 200.0, 200.0).is_empty());
    }
}

mod items {
    use super::*;

    fn medkit(id: u64, pos: Vec2) -> cellmap::Shared<Entity> {
        cellmap::shared(Entity::pickup(id.into(), pos, ItemKind::Medkit { heal: 40.0 }))
    }

    #[test]
    fn pickup_heals_and_consumes_the_item() {
        let player = bare_player(1, Vec2::new(500.0, 500.0));
        player.write().apply_damage(50.0);
        let world = build_world(
            quiet_config(),
            vec![player.clone()],
            vec![],
            vec![medkit(20, Vec2::new(500.0, 500.0))],
        );

        assert_eq!(world.arena.pickup(&player), Some(ItemCategory::Health));
        assert_eq!(player.read().health(), 90.0);
        // The ground is now bare.
        assert_eq!(world.arena.pickup(&player), None);
    }

    #[test]
    fn unusable_payload_is_discarded_with_the_item() {
        let player = bare_player(1, Vec2::new(500.0, 500.0));
        let world = build_world(
            quiet_config(),
            vec![player.clone()],
            vec![],
            vec![medkit(20, Vec2::new(500.0, 500.0))],
        );

        // Full health: the merge fails and the item still leaves the world.
        assert_eq!(world.arena.pickup(&player), None);
        let remaining = world
            .arena
            .within_window(500.0, 500.0, 200.0, 200.0)
            .iter()
            .filter(|h| h.read().kind() == EntityKind::Pickup)
            .count();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn lowest_id_item_is_taken_first() {
        let player = bare_player(1, Vec2::new(500.0, 500.0));
        player.write().apply_damage(99.0);
        let world = build_world(
            quiet_config(),
            vec![player.clone()],
            vec![],
            vec![
                medkit(21, Vec2::new(500.0, 500.0)),
                medkit(20, Vec2::new(500.0, 500.0)),
            ],
        );

        assert_eq!(world.arena.pickup(&player), Some(ItemCategory::Health));
        let remaining = world.arena.within_window(500.0, 500.0, 200.0, 200.0);
        let survivor: Vec<_> = remaining
            .iter()
            .filter(|h| h.read().kind() == EntityKind::Pickup)
            .map(|h| h.read().id())
            .collect();
        assert_eq!(survivor, vec![21.into()]);
    }

    #[test]
    fn airborne_players_cannot_pick_up() {
        let player = bare_player(1, Vec2::new(500.0, 500.0));
        player.write().plane = Plane::Airborne;
        let world = build_world(
            quiet_config(),
            vec![player.clone()],
            vec![],
            vec![medkit(20, Vec2::new(500.0, 500.0))],
        );

        assert_eq!(world.arena.pickup(&player), None);
        player.write().plane = Plane::Ground;
        player.write().apply_damage(50.0);
        assert_eq!(world.arena.pickup(&player), Some(ItemCategory::Health));
    }

    #[test]
    fn dropped_weapon_can_be_reclaimed() {
        let player = armed_player(1, Vec2::new(500.0, 500.0), WeaponKind::Pistol);
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        assert!(world.arena.drop_weapon(&player));
        assert!(!world.arena.drop_weapon(&player));
        assert!(player
            .read()
            .loadout
            .as_ref()
            .is_some_and(|l| l.primary.is_none() && l.secondary.is_none()));

        assert_eq!(world.arena.pickup(&player), Some(ItemCategory::Weapon));
        assert!(player
            .read()
            .loadout
            .as_ref()
            .is_some_and(|l| l.primary.is_some()));
    }

    #[test]
    fn reload_draws_from_the_reserve() {
        let player = armed_player(1, Vec2::new(500.0, 500.0), WeaponKind::Rifle);
        let world = build_world(quiet_config(), vec![player.clone()], vec![], vec![]);

        for _ in 0..3 {
            assert_eq!(world.arena.attack(&player), AttackOutcome::Fired);
        }
        assert_eq!(world.arena.reload(&player), ReloadOutcome::NoAmmo);

        player
            .write()
            .loadout
            .as_mut()
            .unwrap()
            .stash_ammo(50);
        assert_eq!(world.arena.reload(&player), ReloadOutcome::Reloaded(3));

        let unarmed = bare_player(2, Vec2::new(100.0, 100.0));
        let world = build_world(quiet_config(), vec![unarmed.clone()], vec![], vec![]);
        assert_eq!(world.arena.reload(&unarmed), ReloadOutcome::NoWeapon);
    }
}

mod combat {
    use super::*;

    #[test]
    fn only_the_nearer_obstruction_is_damaged() {
        let shooter = armed_player(1, Vec2::new(100.0, 500.0), WeaponKind::Rifle);
        let near = wall(10, Vec2::new(220.0, 500.0), Vec2::new(20.0, 20.0));
        let far = wall(11, Vec2::new(400.0, 500.0), Vec2::new(20.0, 20.0));
        let world = build_world(
            quiet_config(),
            vec![shooter.clone()],
            vec![near.clone(), far.clone()],
            vec![],
        );

        assert_eq!(world.arena.attack(&shooter), AttackOutcome::FiredContact);
        assert!(near.read().health() < crate::entity::OBSTACLE_HEALTH);
        assert_eq!(far.read().health(), crate::entity::OBSTACLE_HEALTH);

        let events = world.sink.take();
        assert_eq!(super::trajectories(&events), 1);
        assert!(events.iter().any(|e| matches!(
            e,
            ArenaEvent::Hit { target, attacker } if *target == 10.into() && *attacker == 1.into()
        )));
    }

    #[test]
    fn spread_weapons_cast_three_rays() {
        let shooter = armed_player(1, Vec2::new(500.0, 500.0), WeaponKind::Shotgun);
        let world = build_world(quiet_config(), vec![shooter.clone()], vec![], vec![]);

        assert_eq!(world.arena.attack(&shooter), AttackOutcome::Fired);
        assert_eq!(super::trajectories(&world.sink.take()), 3);
    }

    #[test]
    fn multiple_rays_on_one_target_notify_once() {
        let shooter = armed_player(1, Vec2::new(100.0, 500.0), WeaponKind::Shotgun);
        // Wide enough to catch the whole fan at close range.
        let slab = wall(10, Vec2::new(180.0, 500.0), Vec2::new(20.0, 120.0));
        let world = build_world(quiet_config(), vec![shooter.clone()], vec![slab.clone()], vec![]);

        assert_eq!(world.arena.attack(&shooter), AttackOutcome::FiredContact);
        // All three rays connect and each deals damage.
        assert_eq!(
            slab.read().health(),
            crate::entity::OBSTACLE_HEALTH - 3.0 * 8.0
        );
        let hits = world
            .sink
            .take()
            .iter()
            .filter(|e| matches!(e, ArenaEvent::Hit { .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn kills_are_counted_and_announced() {
        let shooter = armed_player(1, Vec2::new(100.0, 500.0), WeaponKind::Rifle);
        let victim = bare_player(2, Vec2::new(200.0, 500.0));
        victim.write().apply_damage(95.0);
        let world = build_world(
            quiet_config(),
            vec![shooter.clone(), victim.clone()],
            vec![],
            vec![],
        );

        assert_eq!(world.arena.attack(&shooter), AttackOutcome::FiredKill);
        assert!(!victim.read().is_alive());
        assert_eq!(shooter.read().loadout.as_ref().unwrap().kills, 1);

        let events = world.sink.take();
        assert!(events.iter().any(|e| matches!(
            e,
            ArenaEvent::Died { entity, killer } if *entity == 2.into() && *killer == Some(1.into())
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, ArenaEvent::KillMessage { .. })));

        // A dead target no longer obstructs or takes damage.
        assert_eq!(world.arena.attack(&shooter), AttackOutcome::Fired);
    }

    #[test]
    fn shields_absorb_before_health() {
        let shooter = armed_player(1, Vec2::new(100.0, 500.0), WeaponKind::Rifle);
        let victim = bare_player(2, Vec2::new(200.0, 500.0));
        victim.write().charge_shield(50.0);
        let world = build_world(
            quiet_config(),
            vec![shooter.clone(), victim.clone()],
            vec![],
            vec![],
        );

        assert_eq!(world.arena.attack(&shooter), AttackOutcome::FiredContact);
        let guard = victim.read();
        assert_eq!(guard.shield(), 30.0);
        assert_eq!(guard.health(), 100.0);
    }

    #[test]
    fn unarmed_attacks_are_melee() {
        let brawler = bare_player(1, Vec2::new(100.0, 500.0));
        let target = wall(10, Vec2::new(125.0, 500.0), Vec2::new(10.0, 40.0));
        let world = build_world(quiet_config(), vec![brawler.clone()], vec![target.clone()], vec![]);

        assert_eq!(world.arena.attack(&brawler), AttackOutcome::MeleeContact);
        assert!(target.read().health() < crate::entity::OBSTACLE_HEALTH);
        // Melee swings draw no trajectories.
        assert_eq!(super::trajectories(&world.sink.take()), 0);

        let lonely = bare_player(2, Vec2::new(800.0, 800.0));
        let world = build_world(quiet_config(), vec![lonely.clone()], vec![], vec![]);
        assert_eq!(world.arena.attack(&lonely), AttackOutcome::Melee);
    }

    #[test]
    fn empty_magazine_does_nothing() {
        let shooter = armed_player(1, Vec2::new(500.0, 500.0), WeaponKind::Shotgun);
        let world = build_world(quiet_config(), vec![shooter.clone()], vec![], vec![]);

        for _ in 0..6 {
            assert_eq!(world.arena.attack(&shooter), AttackOutcome::Fired);
        }
        assert_eq!(world.arena.attack(&shooter), AttackOutcome::None);
        // Six shots, three rays each.
        assert_eq!(super::trajectories(&world.sink.take()), 18);
    }

    #[test]
    fn airborne_players_cannot_attack() {
        let shooter = armed_player(1, Vec2::new(500.0, 500.0), WeaponKind::Rifle);
        shooter.write().plane = Plane::Airborne;
        let world = build_world(quiet_config(), vec![shooter.clone()], vec![], vec![]);

        assert_eq!(world.arena.attack(&shooter), AttackOutcome::None);
    }
}

mod hazard {
    use super::*;

    fn closing_ring() -> HazardConfig {
        HazardConfig {
            center: Vec2::new(500.0, 500.0),
            initial_diameter: 200.0,
            floor_diameter: 100.0,
            shrink_per_tick: 10.0,
            pause_ticks: 1,
            shrink_ticks: 2,
            base_damage: 5.0,
            damage_per_distance: 0.1,
            outside_pace: 0.5,
        }
    }

    #[test]
    fn players_outside_the_ring_take_damage() {
        let mut config = quiet_config();
        config.hazard = closing_ring();
        let safe = bare_player(1, Vec2::new(500.0, 500.0));
        let exposed = bare_player(2, Vec2::new(900.0, 500.0));
        let world = build_world(config, vec![safe.clone(), exposed.clone()], vec![], vec![]);

        world.arena.hazard_tick();
        assert_eq!(safe.read().health(), 100.0);
        assert!(exposed.read().health() < 100.0);
        assert!(world
            .sink
            .take()
            .iter()
            .any(|e| matches!(e, ArenaEvent::HazardDamage { player, .. } if *player == 2.into())));
    }

    #[test]
    fn ring_deaths_have_no_killer() {
        let mut config = quiet_config();
        config.hazard = closing_ring();
        let exposed = bare_player(1, Vec2::new(900.0, 500.0));
        let world = build_world(config, vec![exposed.clone()], vec![], vec![]);

        for _ in 0..10 {
            world.arena.hazard_tick();
        }
        assert!(!exposed.read().is_alive());
        let events = world.sink.take();
        assert!(events.iter().any(|e| matches!(
            e,
            ArenaEvent::Died { entity, killer: None } if *entity == 1.into()
        )));

        // Dead players take no further ring damage.
        world.arena.hazard_tick();
        assert!(world.sink.take().is_empty());
    }

    #[test]
    fn diameter_closes_to_the_floor_and_holds() {
        let mut config = quiet_config();
        config.hazard = closing_ring();
        let world = build_world(config, vec![], vec![], vec![]);

        let mut previous = world.arena.hazard_snapshot().diameter();
        for _ in 0..50 {
            world.arena.hazard_tick();
            let now = world.arena.hazard_snapshot().diameter();
            assert!(now <= previous);
            previous = now;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn background_ticker_runs_alongside_foreground_actions() {
        let mut config = quiet_config();
        config.hazard = closing_ring();
        let player = bare_player(1, Vec2::new(900.0, 500.0));
        let world = build_world(config, vec![player.clone()], vec![], vec![]);

        let mut ticker = HazardTicker::spawn(Arc::clone(&world.arena), Duration::from_millis(2));
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while player.read().health() >= 100.0 && std::time::Instant::now() < deadline {
            world.arena.move_player(&player, 1.0, 0.0);
            world
                .arena
                .within_window(900.0, 500.0, 200.0, 200.0);
            std::thread::sleep(Duration::from_millis(1));
        }
        ticker.stop();

        assert!(player.read().health() < 100.0);
    }
}

mod pausing {
    use super::*;

    #[test]
    fn pause_freezes_every_action() {
        let mut config = quiet_config();
        config.hazard = HazardConfig {
            center: Vec2::new(500.0, 500.0),
            initial_diameter: 100.0,
            floor_diameter: 100.0,
            base_damage: 5.0,
            ..HazardConfig::default()
        };
        let player = armed_player(1, Vec2::new(900.0, 500.0), WeaponKind::Rifle);
        let world = build_world(config, vec![player.clone()], vec![], vec![]);

        world.arena.pause();
        assert!(world.arena.is_paused());
        assert!(!world.arena.move_player(&player, 1.0, 0.0));
        assert_eq!(world.arena.attack(&player), AttackOutcome::None);
        assert_eq!(world.arena.pickup(&player), None);
        world.arena.hazard_tick();
        assert_eq!(player.read().health(), 100.0);
        assert!(world.sink.take().is_empty());

        world.arena.resume();
        assert!(world.arena.move_player(&player, 1.0, 0.0));
    }
}
