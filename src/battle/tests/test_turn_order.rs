#[cfg(test)]
mod tests {
    use crate::battle::state::{CombatEvent, CombatRng};
    use crate::battle::tests::common::{
        assert_ok, create_test_encounter, predictable_rng, starting_order, TestCombatantBuilder,
    };
    use crate::combatant::CombatantId;
    use crate::errors::{CombatError, ErrorKind, SchedulerError};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{DamageSpec, EffectTarget, SkillDefinition, StatusTemplate, TargetType};
    use std::collections::BTreeSet;

    fn ids(raw: &[usize]) -> Vec<CombatantId> {
        raw.iter().copied().map(CombatantId).collect()
    }

    #[rstest]
    #[case(vec![5, 25, 15], vec![1, 2, 0])]
    #[case(vec![30, 20, 10, 40], vec![3, 0, 1, 2])]
    #[case(vec![1, 2, 3, 4, 5], vec![4, 3, 2, 1, 0])]
    fn test_distinct_agility_is_strictly_descending(#[case] agilities: Vec<u32>, #[case] expected: Vec<usize>) {
        // Arrange: alternate factions so combat does not end immediately
        let roster = agilities
            .iter()
            .enumerate()
            .map(|(i, &agi)| {
                let builder = TestCombatantBuilder::new(&format!("C{}", i)).with_agility(agi);
                if i % 2 == 0 { builder.build() } else { builder.enemy().build() }
            })
            .collect();
        let mut encounter = create_test_encounter(roster, CombatRng::seeded(99));

        // Act
        assert_ok(encounter.start_combat());

        // Assert
        let order = starting_order(encounter.events());
        assert_eq!(order, ids(&expected));
        let agility: Vec<u32> = order.iter().map(|id| agilities[id.0]).collect();
        assert!(agility.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(encounter.active_combatant(), Some(CombatantId(expected[0])));
    }

    #[test]
    fn test_ties_keep_the_same_set_for_any_seed() {
        let mut orders = BTreeSet::new();
        for seed in 0..32 {
            // Arrange: three tied at 10 behind one at 20
            let roster = vec![
                TestCombatantBuilder::new("A").with_agility(10).build(),
                TestCombatantBuilder::new("B").with_agility(10).enemy().build(),
                TestCombatantBuilder::new("C").with_agility(10).build(),
                TestCombatantBuilder::new("D").with_agility(20).enemy().build(),
            ];
            let mut encounter = create_test_encounter(roster, CombatRng::seeded(seed));

            // Act
            assert_ok(encounter.start_combat());

            // Assert
            let order = starting_order(encounter.events());
            assert_eq!(order[0], CombatantId(3), "seed {}", seed);
            let tied: BTreeSet<CombatantId> = order[1..].iter().copied().collect();
            assert_eq!(tied, ids(&[0, 1, 2]).into_iter().collect::<BTreeSet<_>>());
            orders.insert(order);
        }
        assert!(orders.len() > 1, "tie-break should vary with the seed");
    }

    #[test]
    fn test_same_seed_gives_same_order() {
        let make = || {
            let roster = (0..6)
                .map(|i| {
                    let builder = TestCombatantBuilder::new(&format!("C{}", i)).with_agility(12);
                    if i < 3 { builder.build() } else { builder.enemy().build() }
                })
                .collect();
            let mut encounter = create_test_encounter(roster, CombatRng::seeded(1234));
            assert_ok(encounter.start_combat());
            starting_order(encounter.events())
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_every_living_combatant_acts_once_per_round() {
        let roster = vec![
            TestCombatantBuilder::new("A").with_agility(8).build(),
            TestCombatantBuilder::new("B").with_agility(8).enemy().build(),
            TestCombatantBuilder::new("C").with_agility(15).build(),
            TestCombatantBuilder::new("D").with_agility(3).enemy().build(),
        ];
        let mut encounter = create_test_encounter(roster, CombatRng::seeded(5));
        assert_ok(encounter.start_combat());

        for _ in 0..11 {
            assert_ok(encounter.end_current_turn());
        }

        // Three full rounds of four turns each
        let mut rounds: Vec<Vec<CombatantId>> = Vec::new();
        for event in encounter.events().events() {
            match event {
                CombatEvent::RoundStarted { .. } => rounds.push(Vec::new()),
                CombatEvent::TurnStarted { combatant, .. } => {
                    if let Some(round) = rounds.last_mut() {
                        round.push(*combatant);
                    }
                }
                _ => {}
            }
        }
        assert_eq!(rounds.len(), 3);
        for round in rounds {
            let unique: BTreeSet<CombatantId> = round.iter().copied().collect();
            assert_eq!(round.len(), 4);
            assert_eq!(unique.len(), 4);
            assert_eq!(round[0], CombatantId(2));
            assert_eq!(round[3], CombatantId(3));
        }
    }

    #[test]
    fn test_slow_reorders_the_next_round() {
        // Arrange: the goblin is barely faster than the hero
        let slow = SkillDefinition::new("Hamstring", 0, TargetType::SingleEnemy)
            .with_status(StatusTemplate::slow(), EffectTarget::Targets);
        let hero = TestCombatantBuilder::new("Hero").with_agility(20).with_skills(vec![slow]).build();
        let goblin = TestCombatantBuilder::new("Goblin").with_agility(21).enemy().build();
        let mut encounter = create_test_encounter(vec![hero, goblin], predictable_rng());
        assert_ok(encounter.start_combat());
        assert_eq!(encounter.active_combatant(), Some(CombatantId(1)));

        // Act: goblin passes, hero slows the goblin (21 -> 19)
        assert_ok(encounter.end_current_turn());
        assert_ok(encounter.use_skill(CombatantId(0), 0, &[CombatantId(1)]));
        assert_eq!(encounter.combatant(CombatantId(1)).unwrap().agility(), 19);
        assert_ok(encounter.end_current_turn());

        // Assert: round 2 starts with the hero
        assert_eq!(encounter.scheduler().round(), 2);
        assert_eq!(encounter.active_combatant(), Some(CombatantId(0)));
    }

    #[test]
    fn test_acts_last_overrides_agility() {
        let fast = TestCombatantBuilder::new("Fast").with_agility(50).build();
        let slow = TestCombatantBuilder::new("Slow").with_agility(1).enemy().build();
        let mut encounter = create_test_encounter(vec![fast, slow], predictable_rng());
        encounter.combatant_mut(CombatantId(0)).unwrap().set_always_acts_last(true);

        assert_ok(encounter.start_combat());
        assert_eq!(starting_order(encounter.events()), ids(&[1, 0]));
    }

    #[test]
    fn test_dead_combatants_leave_the_queue() {
        let execute = SkillDefinition::new("Execute", 0, TargetType::SingleEnemy)
            .with_damage(DamageSpec::magical(10_000, 0.0));
        let roster = vec![
            TestCombatantBuilder::new("A").with_agility(30).with_skills(vec![execute]).build(),
            TestCombatantBuilder::new("B").with_agility(20).enemy().build(),
            TestCombatantBuilder::new("C").with_agility(10).enemy().build(),
        ];
        let mut encounter = create_test_encounter(roster, predictable_rng());
        assert_ok(encounter.start_combat());

        let outcome = assert_ok(encounter.use_skill(CombatantId(0), 0, &[CombatantId(1)]));
        assert_eq!(outcome.deaths, ids(&[1]));
        assert_eq!(encounter.scheduler().queue(), ids(&[2]));
        assert!(!encounter.scheduler().participants().contains(&CombatantId(1)));

        assert_ok(encounter.end_current_turn());
        assert_eq!(encounter.active_combatant(), Some(CombatantId(2)));
    }

    #[test]
    fn test_scheduler_misuse_is_reported() {
        let roster = vec![
            TestCombatantBuilder::new("A").build(),
            TestCombatantBuilder::new("B").enemy().build(),
        ];
        let mut encounter = create_test_encounter(roster, predictable_rng());

        let err = encounter.end_current_turn().unwrap_err();
        assert_eq!(err, CombatError::Scheduler(SchedulerError::NotActive));
        assert_eq!(err.kind(), ErrorKind::InvalidCall);

        assert_ok(encounter.start_combat());
        let err = encounter.start_combat().unwrap_err();
        assert_eq!(err, CombatError::Scheduler(SchedulerError::AlreadyActive));

        let late = TestCombatantBuilder::new("Late").build();
        assert!(encounter.add_combatant(late).is_err());

        let mut empty = create_test_encounter(vec![], predictable_rng());
        assert_eq!(
            empty.start_combat().unwrap_err(),
            CombatError::Scheduler(SchedulerError::EmptyRoster)
        );
    }

    #[test]
    fn test_single_faction_ends_immediately() {
        let roster = vec![
            TestCombatantBuilder::new("A").build(),
            TestCombatantBuilder::new("B").build(),
        ];
        let mut encounter = create_test_encounter(roster, predictable_rng());
        assert_ok(encounter.start_combat());
        assert!(!encounter.is_combat_active());
        assert!(matches!(
            encounter.events().events().last(),
            Some(CombatEvent::CombatEnded { winner: Some(_), .. })
        ));
    }
}
