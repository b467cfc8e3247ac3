use crate::helpers::verify_admin;
use crate::interface::AdminOperations;
use crate::types::{
    BinaryConfig, BoosterConfig, DataKey, Earnings, Error, Feature, LevelStep, LevelUnlockSteps,
    PlanConfig, RewardMilestone, UserData, WithdrawalConfig,
};
use soroban_sdk::{Address, Env, Vec};

/// Depth ceilings for the two cascade rate tables.
pub const MAX_ROI_ON_ROI_LEVELS: u32 = 15;
pub const MAX_LEVEL_INCOME_LEVELS: u32 = 30;

pub struct AdminModule;

impl AdminOperations for AdminModule {
    fn initialize(env: Env, admin: Address, payout_token: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::PayoutToken, &payout_token);
        env.storage().instance().set(&DataKey::EnginePaused, &false);

        // The admin doubles as the root of the sponsor graph so that the
        // first real member has somewhere to register under.
        let root = UserData {
            address: admin.clone(),
            sponsor: None,
            direct_referrals: Vec::new(&env),
            wallet_balance: 0,
            total_investment: 0,
            total_withdrawal: 0,
            earnings: Earnings {
                roi: 0,
                commission: 0,
                binary: 0,
                booster: 0,
                roi_on_roi: 0,
                reward: 0,
            },
            is_active: false,
            first_investment_date: 0,
            rank: 0,
            joined_at: env.ledger().timestamp(),
        };
        env.storage()
            .persistent()
            .set(&DataKey::User(admin.clone()), &root);

        let mut all_users = Vec::new(&env);
        all_users.push_back(admin);
        env.storage().persistent().set(&DataKey::AllUsers, &all_users);
        env.storage().persistent().set(&DataKey::TotalUsers, &1u32);

        Self::store_default_config(&env);
        Ok(())
    }

    fn get_admin(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)
    }

    fn transfer_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        verify_admin(&env)?;
        env.storage().instance().set(&DataKey::Admin, &new_admin);
        Ok(())
    }

    fn pause_engine(env: Env) -> Result<(), Error> {
        verify_admin(&env)?;
        env.storage().instance().set(&DataKey::EnginePaused, &true);
        Ok(())
    }

    fn resume_engine(env: Env) -> Result<(), Error> {
        verify_admin(&env)?;
        env.storage().instance().set(&DataKey::EnginePaused, &false);
        Ok(())
    }

    fn get_paused_state(env: Env) -> Result<bool, Error> {
        Ok(Self::is_engine_paused(&env))
    }

    fn set_feature_enabled(env: Env, feature: Feature, enabled: bool) -> Result<(), Error> {
        verify_admin(&env)?;
        env.storage()
            .instance()
            .set(&DataKey::Feature(feature), &enabled);
        Ok(())
    }

    fn is_feature_enabled(env: Env, feature: Feature) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Feature(feature))
            .unwrap_or(true)
    }

    fn set_plan_config(env: Env, config: PlanConfig) -> Result<(), Error> {
        verify_admin(&env)?;
        if config.base_amount <= 0
            || config.min_amount <= 0
            || config.max_amount < config.min_amount
            || config.daily_roi_bps == 0
            || config.max_return_bps < config.daily_roi_bps
            || config.duration_days == 0
        {
            return Err(Error::InvalidConfig);
        }
        env.storage().instance().set(&DataKey::PlanConfig, &config);
        Ok(())
    }

    fn set_roi_on_roi_rates(env: Env, rates: Vec<u32>) -> Result<(), Error> {
        verify_admin(&env)?;
        Self::validate_rate_table(&rates, MAX_ROI_ON_ROI_LEVELS)?;
        env.storage()
            .instance()
            .set(&DataKey::RoiOnRoiRates, &rates);
        Ok(())
    }

    fn set_level_income_rates(env: Env, rates: Vec<u32>) -> Result<(), Error> {
        verify_admin(&env)?;
        Self::validate_rate_table(&rates, MAX_LEVEL_INCOME_LEVELS)?;
        env.storage()
            .instance()
            .set(&DataKey::LevelIncomeRates, &rates);
        Ok(())
    }

    fn set_level_unlock_steps(env: Env, steps: LevelUnlockSteps) -> Result<(), Error> {
        verify_admin(&env)?;
        if !Self::validate_steps(&steps.roi_on_roi, MAX_ROI_ON_ROI_LEVELS)
            || !Self::validate_steps(&steps.level_income, MAX_LEVEL_INCOME_LEVELS)
        {
            return Err(Error::InvalidConfig);
        }
        env.storage()
            .instance()
            .set(&DataKey::LevelUnlockSteps, &steps);
        Ok(())
    }

    fn set_booster_config(env: Env, config: BoosterConfig) -> Result<(), Error> {
        verify_admin(&env)?;
        if config.countdown_days == 0 || config.target_directs == 0 || config.bonus_roi_bps == 0 {
            return Err(Error::InvalidConfig);
        }
        env.storage()
            .instance()
            .set(&DataKey::BoosterConfig, &config);
        Ok(())
    }

    fn set_binary_config(env: Env, config: BinaryConfig) -> Result<(), Error> {
        verify_admin(&env)?;
        if config.matching_bps == 0
            || config.matching_bps > 10_000
            || config.daily_cap <= 0
            || config.weekly_cap <= 0
            || config.monthly_cap <= 0
            || config.max_carry_forward_days == 0
        {
            return Err(Error::InvalidConfig);
        }
        env.storage()
            .instance()
            .set(&DataKey::BinaryConfig, &config);
        Ok(())
    }

    fn set_withdrawal_config(env: Env, config: WithdrawalConfig) -> Result<(), Error> {
        verify_admin(&env)?;
        if config.tier_before_bps >= 10_000
            || config.tier_after_bps >= 10_000
            || config.tier_boundary_days == 0
        {
            return Err(Error::InvalidConfig);
        }
        env.storage()
            .instance()
            .set(&DataKey::WithdrawalConfig, &config);
        Ok(())
    }

    fn add_reward_milestone(
        env: Env,
        required_volume: i128,
        reward_amount: i128,
    ) -> Result<u32, Error> {
        verify_admin(&env)?;
        if required_volume <= 0 || reward_amount <= 0 {
            return Err(Error::InvalidConfig);
        }

        let id = env
            .storage()
            .instance()
            .get::<_, u32>(&DataKey::MilestoneCount)
            .unwrap_or(0);
        let milestone = RewardMilestone {
            id,
            required_volume,
            reward_amount,
        };
        env.storage()
            .instance()
            .set(&DataKey::RewardMilestone(id), &milestone);
        env.storage()
            .instance()
            .set(&DataKey::MilestoneCount, &(id + 1));
        Ok(id)
    }

    fn remove_reward_milestone(env: Env, milestone_id: u32) -> Result<(), Error> {
        verify_admin(&env)?;
        if !env
            .storage()
            .instance()
            .has(&DataKey::RewardMilestone(milestone_id))
        {
            return Err(Error::MilestoneNotFound);
        }
        env.storage()
            .instance()
            .remove(&DataKey::RewardMilestone(milestone_id));
        Ok(())
    }

    fn get_plan_config(env: Env) -> Result<PlanConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::PlanConfig)
            .ok_or(Error::ConfigMissing)
    }

    fn get_roi_on_roi_rates(env: Env) -> Result<Vec<u32>, Error> {
        env.storage()
            .instance()
            .get(&DataKey::RoiOnRoiRates)
            .ok_or(Error::ConfigMissing)
    }

    fn get_level_income_rates(env: Env) -> Result<Vec<u32>, Error> {
        env.storage()
            .instance()
            .get(&DataKey::LevelIncomeRates)
            .ok_or(Error::ConfigMissing)
    }

    fn get_level_unlock_steps(env: Env) -> Result<LevelUnlockSteps, Error> {
        env.storage()
            .instance()
            .get(&DataKey::LevelUnlockSteps)
            .ok_or(Error::ConfigMissing)
    }

    fn get_booster_config(env: Env) -> Result<BoosterConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::BoosterConfig)
            .ok_or(Error::ConfigMissing)
    }

    fn get_binary_config(env: Env) -> Result<BinaryConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::BinaryConfig)
            .ok_or(Error::ConfigMissing)
    }

    fn get_withdrawal_config(env: Env) -> Result<WithdrawalConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::WithdrawalConfig)
            .ok_or(Error::ConfigMissing)
    }

    fn get_reward_milestones(env: Env) -> Vec<RewardMilestone> {
        let count = env
            .storage()
            .instance()
            .get::<_, u32>(&DataKey::MilestoneCount)
            .unwrap_or(0);
        let mut milestones = Vec::new(&env);
        for id in 0..count {
            if let Some(milestone) = env
                .storage()
                .instance()
                .get::<_, RewardMilestone>(&DataKey::RewardMilestone(id))
            {
                milestones.push_back(milestone);
            }
        }
        milestones
    }
}

// Helper functions
impl AdminModule {
    pub fn is_engine_paused(env: &Env) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::EnginePaused)
            .unwrap_or(false)
    }

    pub fn feature_enabled(env: &Env, feature: Feature) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Feature(feature))
            .unwrap_or(true)
    }

    /// Rate tables must be non-empty, bounded by the cascade depth, and must
    /// not cascade more than 100% in total.
    fn validate_rate_table(rates: &Vec<u32>, max_levels: u32) -> Result<(), Error> {
        if rates.is_empty() || rates.len() > max_levels {
            return Err(Error::InvalidConfig);
        }
        let mut total: u64 = 0;
        for rate in rates.iter() {
            total += rate as u64;
        }
        if total > 10_000 {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }

    /// Steps must be strictly increasing in both directs and unlocked depth.
    fn validate_steps(steps: &Vec<LevelStep>, max_levels: u32) -> bool {
        if steps.is_empty() {
            return false;
        }
        let mut prev_directs = 0u32;
        let mut prev_levels = 0u32;
        for step in steps.iter() {
            if step.min_directs <= prev_directs && prev_levels > 0 {
                return false;
            }
            if step.min_directs == 0 || step.unlocked_levels <= prev_levels {
                return false;
            }
            if step.unlocked_levels > max_levels {
                return false;
            }
            prev_directs = step.min_directs;
            prev_levels = step.unlocked_levels;
        }
        true
    }

    fn store_default_config(env: &Env) {
        // Conservative defaults; the commission configuration surface
        // overwrites these before launch.
        let plan = PlanConfig {
            base_amount: 100_0000000,
            min_amount: 100_0000000,
            max_amount: 100_000_0000000,
            daily_roi_bps: 50,      // 0.5% per day
            max_return_bps: 20_000, // 200% ceiling
            duration_days: 365,
        };
        env.storage().instance().set(&DataKey::PlanConfig, &plan);

        let booster = BoosterConfig {
            countdown_days: 30,
            target_directs: 2,
            bonus_roi_bps: 1_000, // +10% on the daily return
        };
        env.storage().instance().set(&DataKey::BoosterConfig, &booster);

        let binary = BinaryConfig {
            matching_bps: 1_000, // 10% of matched volume
            daily_cap: 1_000_0000000,
            weekly_cap: 5_000_0000000,
            monthly_cap: 15_000_0000000,
            max_carry_forward_days: 30,
        };
        env.storage().instance().set(&DataKey::BinaryConfig, &binary);

        let withdrawal = WithdrawalConfig {
            tier_before_bps: 1_000, // 10% when held under the boundary
            tier_after_bps: 500,    // 5% afterwards
            tier_boundary_days: 30,
        };
        env.storage()
            .instance()
            .set(&DataKey::WithdrawalConfig, &withdrawal);

        let mut roi_steps = Vec::new(env);
        roi_steps.push_back(LevelStep { min_directs: 1, unlocked_levels: 1 });
        roi_steps.push_back(LevelStep { min_directs: 2, unlocked_levels: 2 });
        roi_steps.push_back(LevelStep { min_directs: 3, unlocked_levels: 4 });
        roi_steps.push_back(LevelStep { min_directs: 5, unlocked_levels: 7 });
        roi_steps.push_back(LevelStep { min_directs: 9, unlocked_levels: 10 });
        roi_steps.push_back(LevelStep { min_directs: 10, unlocked_levels: 15 });

        let mut income_steps = Vec::new(env);
        income_steps.push_back(LevelStep { min_directs: 1, unlocked_levels: 2 });
        income_steps.push_back(LevelStep { min_directs: 2, unlocked_levels: 5 });
        income_steps.push_back(LevelStep { min_directs: 3, unlocked_levels: 10 });
        income_steps.push_back(LevelStep { min_directs: 5, unlocked_levels: 20 });
        income_steps.push_back(LevelStep { min_directs: 10, unlocked_levels: 30 });

        let steps = LevelUnlockSteps {
            roi_on_roi: roi_steps,
            level_income: income_steps,
        };
        env.storage()
            .instance()
            .set(&DataKey::LevelUnlockSteps, &steps);

        // The two cascade rate tables are intentionally left unset: the
        // cascades stay dormant until the commission configuration surface
        // supplies them.
    }
}
