use crate::admin::AdminModule;
use crate::graph::SponsorGraphModule;
use crate::helpers::{
    add_total_distributed, apply_bps, day_index, ensure_engine_active, get_user, month_index,
    record_transaction, save_user, verify_admin, week_index, DAY_SECS,
};
use crate::interface::BinaryOperations;
use crate::types::{
    BinaryConfig, BinaryNode, BinaryRunSummary, DataKey, Error, Feature, Transaction,
    TransactionKind,
};
use soroban_sdk::{Address, Env, Symbol, Vec};

pub struct BinaryMatchingModule;

impl BinaryOperations for BinaryMatchingModule {
    /// Matching run over every placed member. Independently schedulable from
    /// the daily ROI job; shares its failure-isolation and day-marker
    /// semantics.
    fn distribute_binary_matching(env: Env) -> Result<BinaryRunSummary, Error> {
        ensure_engine_active(&env)?;
        verify_admin(&env)?;

        let mut summary = BinaryRunSummary {
            processed: 0,
            total_paid: 0,
        };
        if !AdminModule::feature_enabled(&env, Feature::Binary) {
            return Ok(summary);
        }
        let config: BinaryConfig = match env.storage().instance().get(&DataKey::BinaryConfig) {
            Some(config) => config,
            None => return Ok(summary),
        };

        let now = env.ledger().timestamp();
        let today = day_index(now);
        let members = env
            .storage()
            .persistent()
            .get::<_, Vec<Address>>(&DataKey::BinaryMembers)
            .unwrap_or_else(|| Vec::new(&env));

        for member in members.iter() {
            if env
                .storage()
                .persistent()
                .has(&DataKey::BinaryMark(member.clone(), today))
            {
                continue;
            }
            match Self::match_member(&env, &member, &config, now) {
                Ok(paid) => {
                    if paid > 0 {
                        summary.processed += 1;
                        summary.total_paid += paid;
                    }
                }
                Err(_) => {
                    env.events()
                        .publish((Symbol::new(&env, "binary_failed"), member.clone()), ());
                }
            }
            env.storage()
                .persistent()
                .set(&DataKey::BinaryMark(member, today), &true);
        }

        env.events().publish(
            (Symbol::new(&env, "binary_run_completed"),),
            summary.clone(),
        );
        Ok(summary)
    }
}

// Helper functions
impl BinaryMatchingModule {
    /// Pay one member's matching bonus from the lesser leg. Volume that sat
    /// unmatched longer than the carry-forward window is discarded before
    /// matching; matched volume leaves both legs whatever the caps pay out.
    fn match_member(
        env: &Env,
        member: &Address,
        config: &BinaryConfig,
        now: u64,
    ) -> Result<i128, Error> {
        let mut node: BinaryNode = env
            .storage()
            .persistent()
            .get(&DataKey::BinaryNode(member.clone()))
            .ok_or(Error::BinaryNodeNotFound)?;

        let window = config.max_carry_forward_days * DAY_SECS;
        if node.left_volume > 0 && now.saturating_sub(node.left_since) > window {
            node.left_volume = 0;
        }
        if node.right_volume > 0 && now.saturating_sub(node.right_since) > window {
            node.right_volume = 0;
        }

        let matched = node.left_volume.min(node.right_volume);
        if matched <= 0 {
            SponsorGraphModule::save_node(env, member, &node);
            return Ok(0);
        }

        // The smallest remaining headroom across the three cap windows
        // bounds the payout.
        let paid_day = Self::paid_in(env, &DataKey::BinaryPaidDay(member.clone(), day_index(now)));
        let paid_week =
            Self::paid_in(env, &DataKey::BinaryPaidWeek(member.clone(), week_index(now)));
        let paid_month = Self::paid_in(
            env,
            &DataKey::BinaryPaidMonth(member.clone(), month_index(now)),
        );
        let headroom = (config.daily_cap - paid_day)
            .min(config.weekly_cap - paid_week)
            .min(config.monthly_cap - paid_month)
            .max(0);

        let bonus = apply_bps(matched, config.matching_bps).min(headroom);

        node.left_volume -= matched;
        node.right_volume -= matched;
        if node.left_volume == 0 {
            node.left_since = now;
        }
        if node.right_volume == 0 {
            node.right_since = now;
        }
        SponsorGraphModule::save_node(env, member, &node);

        if bonus <= 0 {
            return Ok(0);
        }

        let mut member_data = get_user(env, member)?;
        member_data.wallet_balance += bonus;
        member_data.earnings.binary += bonus;
        save_user(env, &member_data);

        record_transaction(
            env,
            member,
            Transaction {
                kind: TransactionKind::BinaryMatching,
                amount: bonus,
                counterparty: None,
                level: 0,
                timestamp: now,
            },
        );
        env.storage().persistent().set(
            &DataKey::BinaryPaidDay(member.clone(), day_index(now)),
            &(paid_day + bonus),
        );
        env.storage().persistent().set(
            &DataKey::BinaryPaidWeek(member.clone(), week_index(now)),
            &(paid_week + bonus),
        );
        env.storage().persistent().set(
            &DataKey::BinaryPaidMonth(member.clone(), month_index(now)),
            &(paid_month + bonus),
        );
        add_total_distributed(env, bonus);

        env.events().publish(
            (Symbol::new(env, "binary_matched"), member.clone()),
            (matched, bonus),
        );
        Ok(bonus)
    }

    fn paid_in(env: &Env, key: &DataKey) -> i128 {
        env.storage().persistent().get(key).unwrap_or(0)
    }
}
