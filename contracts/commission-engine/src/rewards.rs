use crate::admin::AdminModule;
use crate::graph::SponsorGraphModule;
use crate::helpers::{
    add_total_distributed, ensure_engine_active, get_user, month_bounds, record_transaction,
    save_user, verify_admin,
};
use crate::interface::RewardOperations;
use crate::types::{
    BusinessVolume, DataKey, Error, Feature, Package, RewardMilestone, RewardRunSummary,
    Transaction, TransactionKind, UserData,
};
use soroban_sdk::{Address, Env, Symbol, Vec};

pub struct RewardModule;

impl RewardOperations for RewardModule {
    /// Monthly qualification sweep. Only closed calendar months are
    /// accepted; each milestone pays at most once per member per period, so
    /// re-running a month is safe.
    fn distribute_monthly_rewards(
        env: Env,
        month: u32,
        year: u32,
    ) -> Result<RewardRunSummary, Error> {
        ensure_engine_active(&env)?;
        verify_admin(&env)?;

        let mut summary = RewardRunSummary {
            evaluated: 0,
            rewarded: 0,
            total_paid: 0,
        };
        if !AdminModule::feature_enabled(&env, Feature::Rewards) {
            return Ok(summary);
        }

        let (start, end) = month_bounds(month, year)?;
        let now = env.ledger().timestamp();
        if now < end {
            return Err(Error::InvalidPeriod);
        }

        let all_users = env
            .storage()
            .persistent()
            .get::<_, Vec<Address>>(&DataKey::AllUsers)
            .unwrap_or_else(|| Vec::new(&env));

        for user in all_users.iter() {
            let user_data = match get_user(&env, &user) {
                Ok(data) => data,
                Err(_) => continue,
            };
            if user_data.direct_referrals.len() < 3 {
                continue;
            }
            summary.evaluated += 1;
            Self::qualify_member(&env, user_data, month, year, start, end, now, &mut summary);
        }

        env.events().publish(
            (Symbol::new(&env, "reward_run_completed"), month, year),
            summary.clone(),
        );
        Ok(summary)
    }

    fn get_business_volume(
        env: Env,
        user: Address,
        month: u32,
        year: u32,
    ) -> Result<BusinessVolume, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::BusinessVolume(user, month, year))
            .ok_or(Error::InvalidPeriod)
    }
}

// Helper functions
impl RewardModule {
    fn qualify_member(
        env: &Env,
        user_data: UserData,
        month: u32,
        year: u32,
        start: u64,
        end: u64,
        now: u64,
        summary: &mut RewardRunSummary,
    ) {
        let user = user_data.address.clone();

        // Largest three legs by period volume.
        let mut leg1 = 0i128;
        let mut leg2 = 0i128;
        let mut leg3 = 0i128;
        for direct in user_data.direct_referrals.iter() {
            let volume = Self::leg_volume(env, &direct, start, end);
            if volume >= leg1 {
                leg3 = leg2;
                leg2 = leg1;
                leg1 = volume;
            } else if volume >= leg2 {
                leg3 = leg2;
                leg2 = volume;
            } else if volume > leg3 {
                leg3 = volume;
            }
        }

        let qualified = Self::qualified_volume(leg1, leg2, leg3);

        // The period record is written once and never recomputed.
        let volume_key = DataKey::BusinessVolume(user.clone(), month, year);
        if !env.storage().persistent().has(&volume_key) {
            env.storage().persistent().set(
                &volume_key,
                &BusinessVolume {
                    leg1,
                    leg2,
                    leg3,
                    qualified_volume: qualified,
                },
            );
        }

        if qualified <= 0 {
            return;
        }

        let milestone_count = env
            .storage()
            .instance()
            .get::<_, u32>(&DataKey::MilestoneCount)
            .unwrap_or(0);
        let mut user_data = user_data;
        let mut changed = false;
        for milestone_id in 0..milestone_count {
            let milestone: RewardMilestone = match env
                .storage()
                .instance()
                .get(&DataKey::RewardMilestone(milestone_id))
            {
                Some(milestone) => milestone,
                None => continue,
            };
            if milestone.required_volume > qualified {
                continue;
            }
            let mark = DataKey::RewardMark(user.clone(), milestone_id, month, year);
            if env.storage().persistent().has(&mark) {
                continue;
            }

            user_data.wallet_balance += milestone.reward_amount;
            user_data.earnings.reward += milestone.reward_amount;
            if user_data.rank < milestone_id + 1 {
                user_data.rank = milestone_id + 1;
            }
            changed = true;

            env.storage().persistent().set(&mark, &true);
            record_transaction(
                env,
                &user,
                Transaction {
                    kind: TransactionKind::Reward,
                    amount: milestone.reward_amount,
                    counterparty: None,
                    level: 0,
                    timestamp: now,
                },
            );
            add_total_distributed(env, milestone.reward_amount);
            summary.rewarded += 1;
            summary.total_paid += milestone.reward_amount;

            env.events().publish(
                (Symbol::new(env, "reward_paid"), user.clone(), milestone_id),
                milestone.reward_amount,
            );
        }
        if changed {
            save_user(env, &user_data);
        }
    }

    /// Sum of package principal created inside the period across a direct
    /// referral and their entire downline.
    fn leg_volume(env: &Env, leg_root: &Address, start: u64, end: u64) -> i128 {
        let mut volume = Self::member_period_volume(env, leg_root, start, end);
        for member in SponsorGraphModule::all_downline(env, leg_root).iter() {
            volume += Self::member_period_volume(env, &member, start, end);
        }
        volume
    }

    fn member_period_volume(env: &Env, member: &Address, start: u64, end: u64) -> i128 {
        let owned = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::UserPackages(member.clone()))
            .unwrap_or_else(|| Vec::new(env));
        let mut volume = 0i128;
        for id in owned.iter() {
            if let Some(package) = env
                .storage()
                .persistent()
                .get::<_, Package>(&DataKey::Package(id))
            {
                if package.created_at >= start && package.created_at < end {
                    volume += package.principal;
                }
            }
        }
        volume
    }

    /// The 40:40:20 ratio cap. The third leg is taken as the 20% leg, so the
    /// full potential is five times it; the two larger legs must each cover
    /// 40% of that potential or they bound it instead.
    pub fn qualified_volume(leg1: i128, leg2: i128, leg3: i128) -> i128 {
        let potential = leg3 * 5;
        if potential <= 0 {
            return 0;
        }
        let needed = potential * 40 / 100;
        if leg1 >= needed && leg2 >= needed {
            potential
        } else {
            potential.min(leg2 * 100 / 40).min(leg1 * 100 / 40)
        }
    }
}
