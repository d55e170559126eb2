//! Property tests for controller invariants.

use calmroom_core::games::{PatternSettings, ReactionSettings};
use calmroom_core::random::seeded_rng;
use calmroom_core::{
    Controller, ManualClock, PatternMemory, ReactionTimer, Stretch, StretchCatalog, StretchPlayer,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn reaction_best_is_min_and_early_taps_never_record(
        seed in any::<u64>(),
        plan in prop::collection::vec((any::<bool>(), 0u64..1_000), 1..40),
    ) {
        let clock = ManualClock::new();
        let mut timer = ReactionTimer::new(&ReactionSettings::default(), clock.clone(), seeded_rng(seed)).unwrap();
        let mut expected_samples = 0usize;

        for (early, reaction) in plan {
            timer.tap(); // arm from idle or result
            let due = timer.next_due_ms().unwrap();
            if early {
                clock.set(due - 1);
                timer.tap();
            } else {
                clock.set(due + reaction);
                timer.tap();
                expected_samples += 1;
            }
        }

        prop_assert_eq!(timer.samples().len(), expected_samples);
        let min = timer.samples().iter().map(|s| s.reaction_ms).min();
        prop_assert_eq!(timer.best_ms(), min);
    }

    #[test]
    fn pattern_length_tracks_level_and_high_score_never_drops(
        seed in any::<u64>(),
        rounds in prop::collection::vec(0usize..6, 1..6),
    ) {
        let clock = ManualClock::new();
        let mut game = PatternMemory::new(&PatternSettings::default(), clock.clone(), seeded_rng(seed)).unwrap();
        let mut last_high = 0;

        for correct_levels in rounds {
            game.start();
            loop {
                while game.is_showing_pattern() {
                    clock.set(game.next_due_ms().unwrap());
                    game.tick();
                }
                prop_assert_eq!(game.sequence().len() as u32, game.level());
                if game.level() as usize > correct_levels {
                    let wrong = (game.sequence()[0] + 1) % 4;
                    game.tap(wrong);
                    prop_assert!(game.is_game_over());
                    break;
                }
                let sequence = game.sequence().to_vec();
                for tile in sequence {
                    game.tap(tile);
                }
            }
            prop_assert!(game.high_score() >= last_high);
            last_high = game.high_score();
        }
    }

    #[test]
    fn stretch_countdown_never_ends_before_last_step(
        total_secs in 1u64..60,
        steps in 1usize..8,
    ) {
        let clock = ManualClock::new();
        let mut player = StretchPlayer::new(StretchCatalog::builtin(), clock.clone());
        let labels: Vec<String> = (0..steps).map(|i| format!("step {i}")).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        player.select(Stretch::new("Generated", total_secs, &refs)).unwrap();
        player.play();

        let last = steps - 1;
        let mut last_reached_ms = if last == 0 { Some(0) } else { None };
        let mut zero_reached_ms = None;
        let mut now = 0;
        while zero_reached_ms.is_none() {
            now += 100;
            clock.set(now);
            player.tick();
            if last_reached_ms.is_none() && player.current_step_index() == last {
                last_reached_ms = Some(now);
            }
            if player.remaining_secs() == 0 {
                zero_reached_ms = Some(now);
            }
        }
        let last_reached = last_reached_ms.unwrap();
        prop_assert!(zero_reached_ms.unwrap() >= last_reached);

        player.reset();
        prop_assert_eq!(player.remaining_secs(), total_secs);
        prop_assert_eq!(player.current_step_index(), 0);
    }
}
