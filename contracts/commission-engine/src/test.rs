use super::*;
use crate::helpers::{month_bounds, DAY_SECS};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::token::{StellarAssetClient, TokenClient};
use soroban_sdk::vec;

/// One token in stroop-style units.
pub const UNIT: i128 = 10_000_000;

#[cfg(test)]
mod test_setup {
    use super::*;

    pub fn setup_engine(e: &Env) -> (CommissionEngineClient, Address, Address) {
        let admin = Address::generate(e);
        let token = e.register_stellar_asset_contract_v2(admin.clone());
        let contract_id = e.register(CommissionEngine, ());
        let client = CommissionEngineClient::new(e, &contract_id);

        e.mock_all_auths();
        client.initialize(&admin, &token.address());

        (client, admin, token.address())
    }

    /// A 5%-per-day plan with a 200% ceiling, used by most distribution
    /// tests because the figures stay whole.
    pub fn set_default_plan(client: &CommissionEngineClient) {
        client.set_plan_config(&PlanConfig {
            base_amount: 100 * UNIT,
            min_amount: 100 * UNIT,
            max_amount: 100_000 * UNIT,
            daily_roi_bps: 500,
            max_return_bps: 20_000,
            duration_days: 365,
        });
    }

    /// A single-step table that unlocks every depth from the first active
    /// direct.
    pub fn unlock_everything(client: &CommissionEngineClient) {
        let env = client.env.clone();
        client.set_level_unlock_steps(&LevelUnlockSteps {
            roi_on_roi: vec![
                &env,
                LevelStep {
                    min_directs: 1,
                    unlocked_levels: 15,
                },
            ],
            level_income: vec![
                &env,
                LevelStep {
                    min_directs: 1,
                    unlocked_levels: 30,
                },
            ],
        });
    }

    pub fn register(e: &Env, client: &CommissionEngineClient, sponsor: &Address) -> Address {
        let user = Address::generate(e);
        client.register_user(&user, sponsor);
        user
    }

    pub fn fund(e: &Env, token: &Address, to: &Address, amount: i128) {
        StellarAssetClient::new(e, token).mint(to, &amount);
    }
}

mod test_admin {
    use super::*;

    #[test]
    #[should_panic(expected = "Error(Contract, #2)")]
    fn test_double_initialization() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);

        env.mock_all_auths();
        client.initialize(&admin, &token);
    }

    #[test]
    fn test_pause_resume() {
        let env = Env::default();
        let (client, admin, _) = test_setup::setup_engine(&env);

        client.pause_engine();
        assert!(client.get_paused_state());
        assert!(client
            .try_register_user(&Address::generate(&env), &admin)
            .is_err());

        client.resume_engine();
        assert!(!client.get_paused_state());
        test_setup::register(&env, &client, &admin);
    }

    #[test]
    fn test_rate_table_validation() {
        let env = Env::default();
        let (client, _, _) = test_setup::setup_engine(&env);

        // Empty, oversized and over-100% tables are all rejected.
        assert!(client.try_set_roi_on_roi_rates(&vec![&env]).is_err());
        let mut oversized = vec![&env];
        for _ in 0..16 {
            oversized.push_back(100u32);
        }
        assert!(client.try_set_roi_on_roi_rates(&oversized).is_err());
        assert!(client
            .try_set_roi_on_roi_rates(&vec![&env, 9_000u32, 2_000u32])
            .is_err());

        client.set_roi_on_roi_rates(&vec![&env, 1_200u32, 1_000u32, 800u32]);
        assert_eq!(
            client.get_roi_on_roi_rates(),
            vec![&env, 1_200u32, 1_000u32, 800u32]
        );

        // Initialization seeds the remaining configuration with defaults.
        assert_eq!(client.get_booster_config().target_directs, 2);
        assert_eq!(client.get_withdrawal_config().tier_boundary_days, 30);
    }

    #[test]
    fn test_plan_and_withdrawal_config_validation() {
        let env = Env::default();
        let (client, _, _) = test_setup::setup_engine(&env);

        assert!(client
            .try_set_plan_config(&PlanConfig {
                base_amount: 100 * UNIT,
                min_amount: 500 * UNIT,
                max_amount: 100 * UNIT,
                daily_roi_bps: 500,
                max_return_bps: 20_000,
                duration_days: 365,
            })
            .is_err());

        assert!(client
            .try_set_withdrawal_config(&WithdrawalConfig {
                tier_before_bps: 10_000,
                tier_after_bps: 500,
                tier_boundary_days: 30,
            })
            .is_err());
    }

    #[test]
    fn test_feature_toggle_blocks_purchase() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);

        let user = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &user, 100 * UNIT);

        client.set_feature_enabled(&Feature::Roi, &false);
        assert!(client.try_purchase_package(&user, &(100 * UNIT)).is_err());

        // A disabled feature also silences the daily job instead of
        // failing it.
        let summary = client.distribute_daily_roi();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.total_amount, 0);

        client.set_feature_enabled(&Feature::Roi, &true);
        client.purchase_package(&user, &(100 * UNIT));
    }
}

mod test_graph {
    use super::*;

    #[test]
    fn test_upline_chain_and_downline() {
        let env = Env::default();
        let (client, admin, _) = test_setup::setup_engine(&env);

        let a = test_setup::register(&env, &client, &admin);
        let b = test_setup::register(&env, &client, &a);
        let c = test_setup::register(&env, &client, &b);

        let chain = client.get_upline_chain(&c);
        assert_eq!(
            chain,
            vec![
                &env,
                (b.clone(), 1u32),
                (a.clone(), 2u32),
                (admin.clone(), 3u32)
            ]
        );

        let downline = client.get_all_downline(&a);
        assert_eq!(downline.len(), 2);
        assert!(downline.contains(&b));
        assert!(downline.contains(&c));
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #8)")]
    fn test_self_sponsorship_rejected() {
        let env = Env::default();
        let (client, _, _) = test_setup::setup_engine(&env);

        let user = Address::generate(&env);
        client.register_user(&user, &user);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #5)")]
    fn test_duplicate_registration_rejected() {
        let env = Env::default();
        let (client, admin, _) = test_setup::setup_engine(&env);

        let user = test_setup::register(&env, &client, &admin);
        client.register_user(&user, &admin);
    }

    #[test]
    fn test_binary_placement_rules() {
        let env = Env::default();
        let (client, admin, _) = test_setup::setup_engine(&env);

        let root = test_setup::register(&env, &client, &admin);
        let u1 = test_setup::register(&env, &client, &admin);
        let u2 = test_setup::register(&env, &client, &admin);
        let u3 = test_setup::register(&env, &client, &admin);

        client.place_binary(&u1, &root, &Leg::Left);
        client.place_binary(&u2, &root, &Leg::Right);

        // Occupied slot.
        assert!(client.try_place_binary(&u3, &root, &Leg::Left).is_err());
        // Double placement.
        assert!(client.try_place_binary(&u1, &u2, &Leg::Left).is_err());
        // Placing the root under its own descendant closes a cycle.
        assert!(client.try_place_binary(&root, &u1, &Leg::Left).is_err());

        let node = client.get_binary_node(&root);
        assert_eq!(node.left_child, Some(u1));
        assert_eq!(node.right_child, Some(u2));
    }
}

mod test_packages {
    use super::*;

    #[test]
    fn test_purchase_validation() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        client.set_plan_config(&PlanConfig {
            base_amount: 100 * UNIT,
            min_amount: 100 * UNIT,
            max_amount: 1_000 * UNIT,
            daily_roi_bps: 500,
            max_return_bps: 20_000,
            duration_days: 365,
        });

        let user = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &user, 2_000 * UNIT);

        assert!(client.try_purchase_package(&user, &0).is_err());
        assert!(client.try_purchase_package(&user, &(50 * UNIT)).is_err());
        assert!(client.try_purchase_package(&user, &(2_000 * UNIT)).is_err());
        assert!(client.try_purchase_package(&user, &(150 * UNIT)).is_err());

        let package_id = client.purchase_package(&user, &(200 * UNIT));
        let package = client.get_package(&package_id);
        assert_eq!(package.principal, 200 * UNIT);
        assert_eq!(package.daily_roi_amount, 10 * UNIT);
        assert_eq!(package.total_roi_limit, 400 * UNIT);
        assert_eq!(package.status, PackageStatus::Active);
        assert!(!package.has_booster);

        let info = client.get_user_info(&user);
        assert!(info.is_active);
        assert_eq!(info.total_investment, 200 * UNIT);
    }

    #[test]
    fn test_first_investment_date_is_immutable() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);

        env.ledger().set_timestamp(1_000);
        let user = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &user, 300 * UNIT);

        client.purchase_package(&user, &(100 * UNIT));
        let first = client.get_user_info(&user).first_investment_date;
        assert_eq!(first, 1_000);

        env.ledger().set_timestamp(1_000 + 40 * DAY_SECS);
        client.purchase_package(&user, &(100 * UNIT));
        assert_eq!(client.get_user_info(&user).first_investment_date, first);
    }

    #[test]
    fn test_level_income_cascade() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);
        test_setup::unlock_everything(&client);
        client.set_level_income_rates(&vec![&env, 1_000u32, 500u32]);

        let s1 = test_setup::register(&env, &client, &admin);
        let s2 = test_setup::register(&env, &client, &s1);
        let buyer = test_setup::register(&env, &client, &s2);
        test_setup::fund(&env, &token, &s2, 100 * UNIT);
        test_setup::fund(&env, &token, &buyer, 200 * UNIT);

        // s2 unlocks through the buyer becoming active; s1 has no active
        // direct yet, so the level-2 slot is consumed without credit.
        client.purchase_package(&buyer, &(100 * UNIT));
        assert_eq!(client.get_user_info(&s2).earnings.commission, 10 * UNIT);
        assert_eq!(client.get_user_info(&s1).earnings.commission, 0);

        // s2's own purchase pays s1 at level 1 and makes s2 an active
        // direct of s1.
        client.purchase_package(&s2, &(100 * UNIT));
        assert_eq!(client.get_user_info(&s1).earnings.commission, 10 * UNIT);

        // With s1 unlocked, a second buyer purchase reaches level 2.
        client.purchase_package(&buyer, &(100 * UNIT));
        assert_eq!(client.get_user_info(&s2).earnings.commission, 20 * UNIT);
        assert_eq!(client.get_user_info(&s1).earnings.commission, 15 * UNIT);
    }
}

mod test_levels {
    use super::*;

    #[test]
    fn test_unlocked_levels_follow_step_table() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);
        client.set_level_unlock_steps(&LevelUnlockSteps {
            roi_on_roi: vec![
                &env,
                LevelStep { min_directs: 1, unlocked_levels: 1 },
                LevelStep { min_directs: 2, unlocked_levels: 3 },
                LevelStep { min_directs: 5, unlocked_levels: 10 },
            ],
            level_income: vec![
                &env,
                LevelStep { min_directs: 1, unlocked_levels: 2 },
                LevelStep { min_directs: 2, unlocked_levels: 6 },
                LevelStep { min_directs: 5, unlocked_levels: 20 },
            ],
        });

        let sponsor = test_setup::register(&env, &client, &admin);
        let d1 = test_setup::register(&env, &client, &sponsor);
        let d2 = test_setup::register(&env, &client, &sponsor);
        let d3 = test_setup::register(&env, &client, &sponsor);

        // Registered but uninvested directs unlock nothing.
        let unlocked = client.get_unlocked_levels(&sponsor);
        assert_eq!(unlocked.roi_on_roi, 0);
        assert_eq!(unlocked.level_income, 0);

        for direct in [&d1, &d2] {
            test_setup::fund(&env, &token, direct, 100 * UNIT);
            client.purchase_package(direct, &(100 * UNIT));
        }
        assert_eq!(client.get_directs_with_active_package(&sponsor), 2);
        let unlocked = client.get_unlocked_levels(&sponsor);
        assert_eq!(unlocked.roi_on_roi, 3);
        assert_eq!(unlocked.level_income, 6);

        // A third direct is not enough for the five-direct step.
        test_setup::fund(&env, &token, &d3, 100 * UNIT);
        client.purchase_package(&d3, &(100 * UNIT));
        let unlocked = client.get_unlocked_levels(&sponsor);
        assert_eq!(unlocked.roi_on_roi, 3);
        assert_eq!(unlocked.level_income, 6);
    }
}

mod test_roi {
    use super::*;

    /// The worked scenario: a $1000 package at 5% daily with an achieved
    /// 10% booster and three fully unlocked ancestors at 12%/10%/8%.
    #[test]
    fn test_end_to_end_distribution() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);
        test_setup::unlock_everything(&client);
        client.set_roi_on_roi_rates(&vec![&env, 1_200u32, 1_000u32, 800u32]);
        client.set_booster_config(&BoosterConfig {
            countdown_days: 30,
            target_directs: 1,
            bonus_roi_bps: 1_000,
        });

        let a1 = test_setup::register(&env, &client, &admin);
        let a2 = test_setup::register(&env, &client, &a1);
        let a3 = test_setup::register(&env, &client, &a2);
        let owner = test_setup::register(&env, &client, &a3);
        let leaf = test_setup::register(&env, &client, &owner);

        test_setup::fund(&env, &token, &a2, 100 * UNIT);
        test_setup::fund(&env, &token, &a3, 100 * UNIT);
        test_setup::fund(&env, &token, &owner, 2_000 * UNIT);
        test_setup::fund(&env, &token, &leaf, 100 * UNIT);

        // Every ancestor needs an active package so the chain stays
        // unlocked, and the leaf purchase achieves the owner's booster.
        client.purchase_package(&a2, &(100 * UNIT));
        client.purchase_package(&a3, &(100 * UNIT));
        client.purchase_package(&owner, &(1_000 * UNIT));
        client.purchase_package(&leaf, &(100 * UNIT));
        assert_eq!(client.get_booster(&owner).status, BoosterStatus::Achieved);

        // Flush today's distribution for the setup packages, then buy the
        // package under test so it is the only unmarked one.
        client.distribute_daily_roi();
        let package_id = client.purchase_package(&owner, &(1_000 * UNIT));

        let owner_before = client.get_user_info(&owner);
        let a1_before = client.get_user_info(&a1);
        let a2_before = client.get_user_info(&a2);
        let a3_before = client.get_user_info(&a3);

        let summary = client.distribute_daily_roi();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total_amount, 55 * UNIT);
        assert_eq!(summary.booster_bonuses, 1);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.roi_on_roi_total, 165_000_000); // 16.5 tokens

        let owner_after = client.get_user_info(&owner);
        assert_eq!(
            owner_after.wallet_balance - owner_before.wallet_balance,
            55 * UNIT
        );
        assert_eq!(owner_after.earnings.roi - owner_before.earnings.roi, 50 * UNIT);
        assert_eq!(
            owner_after.earnings.booster - owner_before.earnings.booster,
            5 * UNIT
        );

        // 12% / 10% / 8% of the 55-token seed.
        let a3_after = client.get_user_info(&a3);
        let a2_after = client.get_user_info(&a2);
        let a1_after = client.get_user_info(&a1);
        assert_eq!(a3_after.earnings.roi_on_roi - a3_before.earnings.roi_on_roi, 66_000_000);
        assert_eq!(a2_after.earnings.roi_on_roi - a2_before.earnings.roi_on_roi, 55_000_000);
        assert_eq!(a1_after.earnings.roi_on_roi - a1_before.earnings.roi_on_roi, 44_000_000);

        let package = client.get_package(&package_id);
        assert_eq!(package.total_roi_earned, 55 * UNIT);
        assert_eq!(package.status, PackageStatus::Active);

        // Every cascade credit carries payout, commission and audit rows.
        let payouts = client.get_payouts(&a3);
        assert_eq!(payouts.get(payouts.len() - 1).unwrap().level, 1);
        assert!(!client.get_commissions(&a3).is_empty());
    }

    #[test]
    fn test_rerun_same_day_is_noop() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);

        let user = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &user, 100 * UNIT);
        client.purchase_package(&user, &(100 * UNIT));

        let first = client.distribute_daily_roi();
        assert_eq!(first.processed, 1);
        let balance = client.get_user_info(&user).wallet_balance;

        let second = client.distribute_daily_roi();
        assert_eq!(second.processed, 0);
        assert_eq!(second.total_amount, 0);
        assert_eq!(client.get_user_info(&user).wallet_balance, balance);
    }

    #[test]
    fn test_package_completes_at_limit() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        // 5% daily against a 7.5% ceiling completes on the second run.
        client.set_plan_config(&PlanConfig {
            base_amount: 100 * UNIT,
            min_amount: 100 * UNIT,
            max_amount: 100_000 * UNIT,
            daily_roi_bps: 500,
            max_return_bps: 750,
            duration_days: 365,
        });

        let user = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &user, 100 * UNIT);
        let package_id = client.purchase_package(&user, &(100 * UNIT));

        let first = client.distribute_daily_roi();
        assert_eq!(first.total_amount, 5 * UNIT);
        assert_eq!(first.completed, 0);

        env.ledger().set_timestamp(DAY_SECS + 5);
        let second = client.distribute_daily_roi();
        assert_eq!(second.total_amount, 25_000_000); // the remaining 2.5
        assert_eq!(second.completed, 1);

        let package = client.get_package(&package_id);
        assert_eq!(package.status, PackageStatus::Completed);
        assert_eq!(package.total_roi_earned, package.total_roi_limit);
        assert!(!client.get_user_info(&user).is_active);

        // Nothing left to process the next day.
        env.ledger().set_timestamp(2 * DAY_SECS + 5);
        let third = client.distribute_daily_roi();
        assert_eq!(third.processed, 0);
        assert_eq!(third.completed, 0);
    }

    #[test]
    fn test_expired_package_completes_without_distribution() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        client.set_plan_config(&PlanConfig {
            base_amount: 100 * UNIT,
            min_amount: 100 * UNIT,
            max_amount: 100_000 * UNIT,
            daily_roi_bps: 500,
            max_return_bps: 20_000,
            duration_days: 10,
        });

        let user = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &user, 100 * UNIT);
        let package_id = client.purchase_package(&user, &(100 * UNIT));

        env.ledger().set_timestamp(11 * DAY_SECS);
        let summary = client.distribute_daily_roi();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total_amount, 0);
        assert_eq!(
            client.get_package(&package_id).status,
            PackageStatus::Completed
        );
    }

    #[test]
    fn test_locked_ancestor_consumes_level_slot() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);
        client.set_roi_on_roi_rates(&vec![&env, 1_200u32, 1_000u32]);
        // Two active directs are needed before anything unlocks.
        client.set_level_unlock_steps(&LevelUnlockSteps {
            roi_on_roi: vec![
                &env,
                LevelStep { min_directs: 2, unlocked_levels: 2 },
            ],
            level_income: vec![
                &env,
                LevelStep { min_directs: 2, unlocked_levels: 2 },
            ],
        });

        let s1 = test_setup::register(&env, &client, &admin);
        let s2 = test_setup::register(&env, &client, &s1);
        let buyer = test_setup::register(&env, &client, &s2);
        let extra = test_setup::register(&env, &client, &s1);

        for (user, amount) in [(&s2, 100), (&extra, 100), (&buyer, 100)] {
            test_setup::fund(&env, &token, user, amount * UNIT);
            client.purchase_package(user, &(amount * UNIT));
        }
        client.distribute_daily_roi();

        // s2 has one active direct (the buyer) and stays locked; s1 has two
        // (s2 and extra) and is open through level 2.
        test_setup::fund(&env, &token, &buyer, 100 * UNIT);
        client.purchase_package(&buyer, &(100 * UNIT));
        let s1_before = client.get_user_info(&s1).earnings.roi_on_roi;
        let s2_before = client.get_user_info(&s2).earnings.roi_on_roi;

        let summary = client.distribute_daily_roi();
        assert_eq!(summary.processed, 1);

        // The locked level-1 ancestor consumed its slot: s1 is paid at the
        // level-2 rate, not promoted to level 1.
        assert_eq!(client.get_user_info(&s2).earnings.roi_on_roi, s2_before);
        assert_eq!(
            client.get_user_info(&s1).earnings.roi_on_roi - s1_before,
            5_000_000 // 10% of the 5-token seed
        );
    }
}

mod test_booster {
    use super::*;

    fn booster_setup(env: &Env) -> (CommissionEngineClient, Address, Address) {
        let (client, admin, token) = test_setup::setup_engine(env);
        test_setup::set_default_plan(&client);
        client.set_booster_config(&BoosterConfig {
            countdown_days: 30,
            target_directs: 2,
            bonus_roi_bps: 1_000,
        });
        (client, admin, token)
    }

    #[test]
    fn test_achieves_at_target_directs() {
        let env = Env::default();
        let (client, admin, token) = booster_setup(&env);

        let sponsor = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &sponsor, 100 * UNIT);
        let package_id = client.purchase_package(&sponsor, &(100 * UNIT));
        assert_eq!(client.get_booster(&sponsor).status, BoosterStatus::Active);

        // One direct short of the target never flips the status.
        let d1 = test_setup::register(&env, &client, &sponsor);
        test_setup::fund(&env, &token, &d1, 100 * UNIT);
        client.purchase_package(&d1, &(100 * UNIT));
        let booster = client.get_booster(&sponsor);
        assert_eq!(booster.status, BoosterStatus::Active);
        assert_eq!(booster.direct_count, 1);

        let d2 = test_setup::register(&env, &client, &sponsor);
        test_setup::fund(&env, &token, &d2, 100 * UNIT);
        client.purchase_package(&d2, &(100 * UNIT));
        let booster = client.get_booster(&sponsor);
        assert_eq!(booster.status, BoosterStatus::Achieved);
        assert_eq!(booster.direct_count, 2);

        // Achievement flags the sponsor's running packages.
        let package = client.get_package(&package_id);
        assert!(package.has_booster);
        assert_eq!(package.booster_roi_bps, 1_000);
    }

    #[test]
    fn test_expires_past_window_without_target() {
        let env = Env::default();
        let (client, admin, token) = booster_setup(&env);

        let sponsor = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &sponsor, 100 * UNIT);
        client.purchase_package(&sponsor, &(100 * UNIT));

        let d1 = test_setup::register(&env, &client, &sponsor);
        test_setup::fund(&env, &token, &d1, 100 * UNIT);
        client.purchase_package(&d1, &(100 * UNIT));

        // Both the sponsor's booster and the direct's own lapse here.
        env.ledger().set_timestamp(31 * DAY_SECS);
        assert_eq!(client.expire_boosters(), 2);
        assert_eq!(client.get_booster(&sponsor).status, BoosterStatus::Expired);

        // Reaching the target after the window never achieves.
        let d2 = test_setup::register(&env, &client, &sponsor);
        test_setup::fund(&env, &token, &d2, 100 * UNIT);
        client.purchase_package(&d2, &(100 * UNIT));
        assert_eq!(client.get_booster(&sponsor).status, BoosterStatus::Expired);
    }

    #[test]
    fn test_achieved_bonus_survives_window_end() {
        let env = Env::default();
        let (client, admin, token) = test_setup::setup_engine(&env);
        test_setup::set_default_plan(&client);
        client.set_booster_config(&BoosterConfig {
            countdown_days: 30,
            target_directs: 1,
            bonus_roi_bps: 1_000,
        });

        let sponsor = test_setup::register(&env, &client, &admin);
        test_setup::fund(&env, &token, &sponsor, 100 * UNIT);
        client.purchase_package(&sponsor, &(100 * UNIT));

        let d1 = test_setup::register(&env, &client, &sponsor);
        test_setup::fund(&env, &token, &d1, 100 * UNIT);
        client.purchase_package(&d1, &(100 * UNIT));
        assert_eq!(client.get_booster(&sponsor).status, BoosterStatus::Achieved);

        // Well past the booster's own window the achieved bonus still pays.
        // The expiry sweep only touches active boosters, never achieved ones.
        env.ledger().set_timestamp(40 * DAY_SECS);
        client.expire_boosters();
        assert_eq!(client.get_booster(&sponsor).status, BoosterStatus::Achieved);
        client.distribute_daily_roi();

        let info = client.get_user_info(&sponsor);
        assert_eq!(info.earnings.roi, 5 * UNIT);
        assert_eq!(info.earnings.booster, 5_000_000); // 10% of the daily 5
    }
}

mod test_binary {
    use super::*;

    fn binary_setup(
        env: &Env,
        daily_cap: i128,
        weekly_cap: i128,
        monthly_cap: i128,
    ) -> (CommissionEngineClient, Address, Address, Address, Address, Address) {
        let (client, admin, token) = test_setup::setup_engine(env);
        test_setup::set_default_plan(&client);
        client.set_binary_config(&BinaryConfig {
            matching_bps: 1_000,
            daily_cap,
            weekly_cap,
            monthly_cap,
            max_carry_forward_days: 30,
        });

        let root = test_setup::register(env, &client, &admin);
        let u1 = test_setup::register(env, &client, &admin);
        let u2 = test_setup::register(env, &client, &admin);
        client.place_binary(&u1, &root, &Leg::Left);
        client.place_binary(&u2, &root, &Leg::Right);
        (client, token, root, u1, u2, admin)
    }

    #[test]
    fn test_matching_pays_from_lesser_leg() {
        let env = Env::default();
        let (client, token, root, u1, u2, _) =
            binary_setup(&env, 1_000 * UNIT, 5_000 * UNIT, 15_000 * UNIT);

        test_setup::fund(&env, &token, &u1, 300 * UNIT);
        test_setup::fund(&env, &token, &u2, 500 * UNIT);
        client.purchase_package(&u1, &(300 * UNIT));
        client.purchase_package(&u2, &(500 * UNIT));

        let node = client.get_binary_node(&root);
        assert_eq!(node.left_volume, 300 * UNIT);
        assert_eq!(node.right_volume, 500 * UNIT);

        let summary = client.distribute_binary_matching();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total_paid, 30 * UNIT); // 10% of the matched 300

        let info = client.get_user_info(&root);
        assert_eq!(info.earnings.binary, 30 * UNIT);

        // The matched volume leaves both legs; the excess carries forward.
        let node = client.get_binary_node(&root);
        assert_eq!(node.left_volume, 0);
        assert_eq!(node.right_volume, 200 * UNIT);

        // A same-day re-run is a no-op.
        let again = client.distribute_binary_matching();
        assert_eq!(again.processed, 0);
        assert_eq!(client.get_user_info(&root).earnings.binary, 30 * UNIT);
    }

    #[test]
    fn test_matching_is_symmetric() {
        let env = Env::default();
        let (client, token, root, u1, u2, _) =
            binary_setup(&env, 1_000 * UNIT, 5_000 * UNIT, 15_000 * UNIT);

        // Mirror of the lesser-leg test: volumes swapped, same bonus.
        test_setup::fund(&env, &token, &u1, 500 * UNIT);
        test_setup::fund(&env, &token, &u2, 300 * UNIT);
        client.purchase_package(&u1, &(500 * UNIT));
        client.purchase_package(&u2, &(300 * UNIT));

        let summary = client.distribute_binary_matching();
        assert_eq!(summary.total_paid, 30 * UNIT);
        let node = client.get_binary_node(&root);
        assert_eq!(node.left_volume, 200 * UNIT);
        assert_eq!(node.right_volume, 0);
    }

    #[test]
    fn test_lowest_cap_bounds_payout() {
        let env = Env::default();
        let (client, token, root, u1, u2, _) =
            binary_setup(&env, 50 * UNIT, 8 * UNIT, 100 * UNIT);

        test_setup::fund(&env, &token, &u1, 300 * UNIT);
        test_setup::fund(&env, &token, &u2, 500 * UNIT);
        client.purchase_package(&u1, &(300 * UNIT));
        client.purchase_package(&u2, &(500 * UNIT));

        // Raw bonus would be 30; the weekly cap is the smallest ceiling.
        let summary = client.distribute_binary_matching();
        assert_eq!(summary.total_paid, 8 * UNIT);
        assert_eq!(client.get_user_info(&root).earnings.binary, 8 * UNIT);
    }

    #[test]
    fn test_stale_volume_is_discarded() {
        let env = Env::default();
        let (client, token, root, u1, u2, _) =
            binary_setup(&env, 1_000 * UNIT, 5_000 * UNIT, 15_000 * UNIT);

        test_setup::fund(&env, &token, &u1, 300 * UNIT);
        client.purchase_package(&u1, &(300 * UNIT));

        // The left volume ages out of the carry-forward window before the
        // right leg ever produces.
        env.ledger().set_timestamp(31 * DAY_SECS);
        test_setup::fund(&env, &token, &u2, 500 * UNIT);
        client.purchase_package(&u2, &(500 * UNIT));

        let summary = client.distribute_binary_matching();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.total_paid, 0);

        let node = client.get_binary_node(&root);
        assert_eq!(node.left_volume, 0);
        assert_eq!(node.right_volume, 500 * UNIT);
    }
}

mod test_rewards {
    use super::*;

    fn rewards_setup(env: &Env) -> (CommissionEngineClient, Address, Address, u64, u64) {
        let (client, admin, token) = test_setup::setup_engine(env);
        client.set_plan_config(&PlanConfig {
            base_amount: 10 * UNIT,
            min_amount: 10 * UNIT,
            max_amount: 100_000 * UNIT,
            daily_roi_bps: 500,
            max_return_bps: 20_000,
            duration_days: 365,
        });
        client.add_reward_milestone(&(100 * UNIT), &(10 * UNIT));

        let (start, end) = month_bounds(6, 2025).unwrap();
        env.ledger().set_timestamp(start + DAY_SECS);
        (client, admin, token, start, end)
    }

    fn build_legs(
        env: &Env,
        client: &CommissionEngineClient,
        token: &Address,
        admin: &Address,
        volumes: [i128; 3],
    ) -> Address {
        let sponsor = test_setup::register(env, client, admin);
        for volume in volumes {
            let direct = test_setup::register(env, client, &sponsor);
            test_setup::fund(env, token, &direct, volume);
            client.purchase_package(&direct, &volume);
        }
        sponsor
    }

    #[test]
    fn test_three_leg_qualification_pays_once() {
        let env = Env::default();
        let (client, admin, token, _, end) = rewards_setup(&env);

        // The worked 100/80/20 example: potential 100, both larger legs
        // clear the 40% bar, so the full potential qualifies.
        let sponsor = build_legs(
            &env,
            &client,
            &token,
            &admin,
            [100 * UNIT, 80 * UNIT, 20 * UNIT],
        );

        env.ledger().set_timestamp(end + DAY_SECS);
        let summary = client.distribute_monthly_rewards(&6, &2025);
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.rewarded, 1);
        assert_eq!(summary.total_paid, 10 * UNIT);

        let volume = client.get_business_volume(&sponsor, &6, &2025);
        assert_eq!(volume.leg1, 100 * UNIT);
        assert_eq!(volume.leg2, 80 * UNIT);
        assert_eq!(volume.leg3, 20 * UNIT);
        assert_eq!(volume.qualified_volume, 100 * UNIT);

        let info = client.get_user_info(&sponsor);
        assert_eq!(info.earnings.reward, 10 * UNIT);
        assert_eq!(info.rank, 1);

        // Re-running the closed month pays nothing new.
        let again = client.distribute_monthly_rewards(&6, &2025);
        assert_eq!(again.rewarded, 0);
        assert_eq!(client.get_user_info(&sponsor).earnings.reward, 10 * UNIT);
    }

    #[test]
    fn test_ratio_cap_bounds_qualification() {
        let env = Env::default();
        let (client, admin, token, _, end) = rewards_setup(&env);

        // The middle leg misses the 40% bar and bounds the qualified
        // volume to 75, under the 100 milestone.
        let sponsor = build_legs(
            &env,
            &client,
            &token,
            &admin,
            [100 * UNIT, 30 * UNIT, 20 * UNIT],
        );

        env.ledger().set_timestamp(end + DAY_SECS);
        let summary = client.distribute_monthly_rewards(&6, &2025);
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.rewarded, 0);

        let volume = client.get_business_volume(&sponsor, &6, &2025);
        assert_eq!(volume.qualified_volume, 75 * UNIT);
        assert_eq!(client.get_user_info(&sponsor).earnings.reward, 0);
    }

    #[test]
    fn test_open_month_is_rejected() {
        let env = Env::default();
        let (client, _, _, _, end) = rewards_setup(&env);

        env.ledger().set_timestamp(end + DAY_SECS);
        assert!(client.try_distribute_monthly_rewards(&7, &2025).is_err());
    }
}

mod test_withdrawal {
    use super::*;

    fn funded_member(
        env: &Env,
    ) -> (CommissionEngineClient, Address, Address) {
        let (client, admin, token) = test_setup::setup_engine(env);
        test_setup::set_default_plan(&client);
        client.set_withdrawal_config(&WithdrawalConfig {
            tier_before_bps: 1_000,
            tier_after_bps: 500,
            tier_boundary_days: 30,
        });

        env.ledger().set_timestamp(1_000);
        let user = test_setup::register(env, &client, &admin);
        test_setup::fund(env, &token, &user, 100 * UNIT);
        client.purchase_package(&user, &(100 * UNIT));
        // One day of 5% ROI funds the wallet.
        client.distribute_daily_roi();
        (client, user, token)
    }

    #[test]
    fn test_principal_tiers_freeze_at_request_time() {
        let env = Env::default();
        let (client, user, _) = funded_member(&env);

        env.ledger().set_timestamp(1_000 + 29 * DAY_SECS);
        let early = client.request_withdrawal(&user, &WithdrawalKind::Principal, &(2 * UNIT));
        let early = client.get_withdrawal(&early);
        assert_eq!(early.days_held, 29);
        assert_eq!(early.deduction_bps, 1_000);
        assert_eq!(early.deduction_amount, 2_000_000);
        assert_eq!(early.final_amount, 18_000_000);

        // Day 30 exactly falls on the later tier.
        env.ledger().set_timestamp(1_000 + 30 * DAY_SECS);
        let late = client.request_withdrawal(&user, &WithdrawalKind::Principal, &(2 * UNIT));
        let late = client.get_withdrawal(&late);
        assert_eq!(late.days_held, 30);
        assert_eq!(late.deduction_bps, 500);
        assert_eq!(late.final_amount, 19_000_000);

        // Earnings withdrawals are never deducted.
        let roi = client.request_withdrawal(&user, &WithdrawalKind::Roi, &UNIT);
        let roi = client.get_withdrawal(&roi);
        assert_eq!(roi.deduction_bps, 0);
        assert_eq!(roi.final_amount, UNIT);
    }

    #[test]
    fn test_reject_refunds_full_requested_amount() {
        let env = Env::default();
        let (client, user, _) = funded_member(&env);

        let before = client.get_user_info(&user).wallet_balance;
        env.ledger().set_timestamp(1_000 + 10 * DAY_SECS);
        let id = client.request_withdrawal(&user, &WithdrawalKind::Principal, &(2 * UNIT));
        assert_eq!(
            client.get_user_info(&user).wallet_balance,
            before - 2 * UNIT
        );

        // The full pre-deduction hold comes back, not the final amount.
        client.reject_withdrawal(&id);
        assert_eq!(client.get_user_info(&user).wallet_balance, before);
        assert_eq!(
            client.get_withdrawal(&id).status,
            WithdrawalStatus::Rejected
        );

        // A resolved request cannot be approved afterwards.
        assert!(client.try_approve_withdrawal(&id).is_err());
    }

    #[test]
    fn test_approve_pays_frozen_final_amount() {
        let env = Env::default();
        let (client, user, token) = funded_member(&env);

        env.ledger().set_timestamp(1_000 + 10 * DAY_SECS);
        let id = client.request_withdrawal(&user, &WithdrawalKind::Principal, &(2 * UNIT));
        client.approve_withdrawal(&id);

        // 10% early-tier deduction leaves 1.8 tokens paid out.
        assert_eq!(TokenClient::new(&env, &token).balance(&user), 18_000_000);
        let info = client.get_user_info(&user);
        assert_eq!(info.total_withdrawal, 18_000_000);

        // No double approval.
        assert!(client.try_approve_withdrawal(&id).is_err());
        assert!(client.try_reject_withdrawal(&id).is_err());
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #22)")]
    fn test_insufficient_balance_rejected() {
        let env = Env::default();
        let (client, user, _) = funded_member(&env);

        client.request_withdrawal(&user, &WithdrawalKind::Roi, &(1_000 * UNIT));
    }
}
