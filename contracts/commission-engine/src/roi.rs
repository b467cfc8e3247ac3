use crate::admin::AdminModule;
use crate::booster::BoosterModule;
use crate::graph::SponsorGraphModule;
use crate::helpers::{
    add_total_distributed, apply_bps, day_index, ensure_engine_active, get_user, record_commission,
    record_payout, record_transaction, save_user, verify_admin,
};
use crate::interface::RoiOperations;
use crate::levels::{LevelUnlockModule, UnlockTable};
use crate::packages::PackageModule;
use crate::types::{
    Commission, DataKey, Error, Feature, Package, PackageStatus, Payout, RoiRunSummary,
    Transaction, TransactionKind,
};
use soroban_sdk::{Address, Env, Symbol, Vec};

pub struct RoiDistributionModule;

impl RoiOperations for RoiDistributionModule {
    /// Daily batch over every active package. One package failing to update
    /// never aborts the run; it is counted, reported and skipped. Re-running
    /// inside the same day is a no-op thanks to the per-package day marker.
    fn distribute_daily_roi(env: Env) -> Result<RoiRunSummary, Error> {
        ensure_engine_active(&env)?;
        verify_admin(&env)?;

        let mut summary = RoiRunSummary {
            processed: 0,
            total_amount: 0,
            completed: 0,
            booster_bonuses: 0,
            roi_on_roi_total: 0,
            failed: 0,
        };
        if !AdminModule::feature_enabled(&env, Feature::Roi) {
            return Ok(summary);
        }

        let now = env.ledger().timestamp();
        let today = day_index(now);
        let active = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::ActivePackages)
            .unwrap_or_else(|| Vec::new(&env));

        for package_id in active.iter() {
            match Self::distribute_package(&env, package_id, now, today, &mut summary) {
                Ok(()) => {}
                Err(_) => {
                    summary.failed += 1;
                    env.events()
                        .publish((Symbol::new(&env, "roi_failed"),), package_id);
                }
            }
        }

        env.events()
            .publish((Symbol::new(&env, "roi_run_completed"),), summary.clone());
        Ok(summary)
    }
}

// Helper functions
impl RoiDistributionModule {
    fn distribute_package(
        env: &Env,
        package_id: u64,
        now: u64,
        today: u64,
        summary: &mut RoiRunSummary,
    ) -> Result<(), Error> {
        let mut package: Package = env
            .storage()
            .persistent()
            .get(&DataKey::Package(package_id))
            .ok_or(Error::PackageNotFound)?;
        if package.status != PackageStatus::Active {
            return Ok(());
        }
        if env
            .storage()
            .persistent()
            .has(&DataKey::RoiMark(package_id, today))
        {
            return Ok(());
        }

        if now > package.expiry_date {
            PackageModule::complete_package(env, &mut package);
            summary.completed += 1;
            return Ok(());
        }

        let remaining = package.total_roi_limit - package.total_roi_earned;
        if remaining <= 0 {
            PackageModule::complete_package(env, &mut package);
            summary.completed += 1;
            return Ok(());
        }

        let base = package.daily_roi_amount.min(remaining);
        let bonus = if package.has_booster && BoosterModule::has_achieved_booster(env, &package.owner)
        {
            apply_bps(base, package.booster_roi_bps)
        } else {
            0
        };
        let credited = base + bonus;

        let mut owner_data = get_user(env, &package.owner)?;
        owner_data.wallet_balance += credited;
        owner_data.earnings.roi += base;
        owner_data.earnings.booster += bonus;
        save_user(env, &owner_data);

        record_transaction(
            env,
            &package.owner,
            Transaction {
                kind: TransactionKind::RoiDistribution,
                amount: base,
                counterparty: None,
                level: 0,
                timestamp: now,
            },
        );
        if bonus > 0 {
            record_transaction(
                env,
                &package.owner,
                Transaction {
                    kind: TransactionKind::BoosterRoi,
                    amount: bonus,
                    counterparty: None,
                    level: 0,
                    timestamp: now,
                },
            );
        }

        // Earned never exceeds the ceiling even when the booster bonus
        // lands on the last sliver of headroom.
        package.total_roi_earned = (package.total_roi_earned + credited).min(package.total_roi_limit);
        let reached_limit = package.total_roi_earned >= package.total_roi_limit;
        if reached_limit {
            PackageModule::complete_package(env, &mut package);
            summary.completed += 1;
        } else {
            env.storage()
                .persistent()
                .set(&DataKey::Package(package_id), &package);
        }

        env.storage()
            .persistent()
            .set(&DataKey::RoiMark(package_id, today), &true);

        summary.processed += 1;
        summary.total_amount += credited;
        if bonus > 0 {
            summary.booster_bonuses += 1;
        }
        add_total_distributed(env, credited);

        // The cascade runs off the credited amount whether or not the
        // package just completed.
        summary.roi_on_roi_total += Self::distribute_roi_on_roi(env, &package.owner, credited, now);
        Ok(())
    }

    /// Walk the owner's sponsor chain and credit each ancestor their
    /// configured share of the seed. An ancestor whose unlocked depth is
    /// below the current level consumes the level slot and gets nothing.
    /// Returns the total distributed, for the run summary.
    fn distribute_roi_on_roi(env: &Env, owner: &Address, seed: i128, now: u64) -> i128 {
        if !AdminModule::feature_enabled(env, Feature::RoiOnRoi) {
            return 0;
        }
        let rates: Vec<u32> = match env.storage().instance().get(&DataKey::RoiOnRoiRates) {
            Some(rates) => rates,
            None => return 0,
        };
        let owner_data = match get_user(env, owner) {
            Ok(data) => data,
            Err(_) => return 0,
        };

        let mut total = 0i128;
        for (ancestor, level) in SponsorGraphModule::upline_chain(env, &owner_data).iter() {
            if level > rates.len() {
                break;
            }
            let mut ancestor_data = match get_user(env, &ancestor) {
                Ok(data) => data,
                Err(_) => continue,
            };
            let unlocked =
                LevelUnlockModule::unlocked_levels(env, &ancestor_data, UnlockTable::RoiOnRoi);
            if level > unlocked {
                continue;
            }
            let share = apply_bps(seed, rates.get(level - 1).unwrap_or(0));
            if share <= 0 {
                continue;
            }

            ancestor_data.wallet_balance += share;
            ancestor_data.earnings.roi_on_roi += share;
            save_user(env, &ancestor_data);

            record_payout(
                env,
                &ancestor,
                Payout {
                    source: owner.clone(),
                    amount: share,
                    level,
                    timestamp: now,
                },
            );
            record_commission(
                env,
                &ancestor,
                Commission {
                    source: owner.clone(),
                    amount: share,
                    level,
                    kind: TransactionKind::RoiOnRoi,
                    timestamp: now,
                },
            );
            record_transaction(
                env,
                &ancestor,
                Transaction {
                    kind: TransactionKind::RoiOnRoi,
                    amount: share,
                    counterparty: Some(owner.clone()),
                    level,
                    timestamp: now,
                },
            );
            total += share;
        }

        if total > 0 {
            add_total_distributed(env, total);
        }
        total
    }
}
