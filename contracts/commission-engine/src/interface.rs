use crate::types::{
    BinaryConfig, BinaryNode, BinaryRunSummary, Booster, BoosterConfig, BusinessVolume, Error,
    Feature, Leg, LevelUnlockSteps, Package, PlanConfig, RewardMilestone, RewardRunSummary,
    RoiRunSummary, UnlockedLevels, UserData, Withdrawal, WithdrawalConfig, WithdrawalKind,
};
use soroban_sdk::{Address, Env, Vec};

/// Manages administrative operations and configuration
pub trait AdminOperations {
    /// Initialize the engine with an admin, payout token and default config
    fn initialize(env: Env, admin: Address, payout_token: Address) -> Result<(), Error>;

    /// Get admin address
    fn get_admin(env: Env) -> Result<Address, Error>;

    /// Transfer admin rights to new address
    fn transfer_admin(env: Env, new_admin: Address) -> Result<(), Error>;

    /// Pause engine operations (emergency)
    fn pause_engine(env: Env) -> Result<(), Error>;

    /// Resume engine operations
    fn resume_engine(env: Env) -> Result<(), Error>;

    /// Check if engine is paused
    fn get_paused_state(env: Env) -> Result<bool, Error>;

    /// Toggle an engine feature on or off
    fn set_feature_enabled(env: Env, feature: Feature, enabled: bool) -> Result<(), Error>;

    /// Check a feature toggle (enabled by default)
    fn is_feature_enabled(env: Env, feature: Feature) -> bool;

    /// Set package purchase rules
    fn set_plan_config(env: Env, config: PlanConfig) -> Result<(), Error>;

    /// Set the per-level rate table for the ROI-on-ROI cascade
    fn set_roi_on_roi_rates(env: Env, rates: Vec<u32>) -> Result<(), Error>;

    /// Set the per-level rate table for purchase-time level income
    fn set_level_income_rates(env: Env, rates: Vec<u32>) -> Result<(), Error>;

    /// Set the directs-to-unlocked-levels step tables
    fn set_level_unlock_steps(env: Env, steps: LevelUnlockSteps) -> Result<(), Error>;

    /// Set booster qualification rules
    fn set_booster_config(env: Env, config: BoosterConfig) -> Result<(), Error>;

    /// Set two-leg matching rules
    fn set_binary_config(env: Env, config: BinaryConfig) -> Result<(), Error>;

    /// Set principal withdrawal deduction tiers
    fn set_withdrawal_config(env: Env, config: WithdrawalConfig) -> Result<(), Error>;

    /// Add a reward milestone, returns its id
    fn add_reward_milestone(env: Env, required_volume: i128, reward_amount: i128)
        -> Result<u32, Error>;

    /// Remove an existing reward milestone
    fn remove_reward_milestone(env: Env, milestone_id: u32) -> Result<(), Error>;

    /// Get package purchase rules
    fn get_plan_config(env: Env) -> Result<PlanConfig, Error>;

    /// Get the ROI-on-ROI rate table
    fn get_roi_on_roi_rates(env: Env) -> Result<Vec<u32>, Error>;

    /// Get the level-income rate table
    fn get_level_income_rates(env: Env) -> Result<Vec<u32>, Error>;

    /// Get the unlock step tables
    fn get_level_unlock_steps(env: Env) -> Result<LevelUnlockSteps, Error>;

    /// Get booster qualification rules
    fn get_booster_config(env: Env) -> Result<BoosterConfig, Error>;

    /// Get two-leg matching rules
    fn get_binary_config(env: Env) -> Result<BinaryConfig, Error>;

    /// Get principal withdrawal deduction tiers
    fn get_withdrawal_config(env: Env) -> Result<WithdrawalConfig, Error>;

    /// Get every configured reward milestone
    fn get_reward_milestones(env: Env) -> Vec<RewardMilestone>;
}

/// Resolves sponsor-graph and placement-tree relationships
pub trait GraphOperations {
    /// Register a new member under a sponsor
    fn register_user(env: Env, user: Address, sponsor: Address) -> Result<(), Error>;

    /// Get a member's record
    fn get_user_info(env: Env, user: Address) -> Result<UserData, Error>;

    /// Ordered ancestors of a member, depth 1 = direct sponsor
    fn get_upline_chain(env: Env, user: Address) -> Result<Vec<(Address, u32)>, Error>;

    /// Count directs that hold at least one active package
    fn get_directs_with_active_package(env: Env, user: Address) -> Result<u32, Error>;

    /// Every member below a member in the sponsor graph
    fn get_all_downline(env: Env, user: Address) -> Result<Vec<Address>, Error>;

    /// Admin placement of a member into the two-leg tree
    fn place_binary(env: Env, user: Address, parent: Address, position: Leg) -> Result<(), Error>;

    /// Get a member's placement-tree node
    fn get_binary_node(env: Env, user: Address) -> Result<BinaryNode, Error>;
}

/// Handles package purchases and the purchase-time cascade
pub trait PackageOperations {
    /// Buy a package, returns its id
    fn purchase_package(env: Env, user: Address, amount: i128) -> Result<u64, Error>;

    /// Get a package by id
    fn get_package(env: Env, package_id: u64) -> Result<Package, Error>;

    /// Get all package ids owned by a member
    fn get_user_packages(env: Env, user: Address) -> Result<Vec<u64>, Error>;
}

/// Runs the daily distribution job
pub trait RoiOperations {
    /// Credit daily returns and cascade shares for every active package
    fn distribute_daily_roi(env: Env) -> Result<RoiRunSummary, Error>;
}

/// Manages booster qualification
pub trait BoosterOperations {
    /// Get a member's booster
    fn get_booster(env: Env, user: Address) -> Result<Booster, Error>;

    /// Recompute a member's active-direct count and achieve if the target is met
    fn refresh_booster_directs(env: Env, user: Address) -> Result<(), Error>;

    /// Expire every active booster past its window, returns the count expired
    fn expire_boosters(env: Env) -> Result<u32, Error>;
}

/// Runs the two-leg matching job
pub trait BinaryOperations {
    /// Pay the matching bonus for every placed member
    fn distribute_binary_matching(env: Env) -> Result<BinaryRunSummary, Error>;
}

/// Runs the monthly 3-leg reward job
pub trait RewardOperations {
    /// Qualify and pay milestones for a closed calendar month
    fn distribute_monthly_rewards(env: Env, month: u32, year: u32)
        -> Result<RewardRunSummary, Error>;

    /// Get a member's closed-period leg volumes
    fn get_business_volume(env: Env, user: Address, month: u32, year: u32)
        -> Result<BusinessVolume, Error>;
}

/// Handles withdrawal requests and their approval flow
pub trait WithdrawalOperations {
    /// Create a request with deduction figures frozen at request time, returns its id
    fn request_withdrawal(
        env: Env,
        user: Address,
        kind: WithdrawalKind,
        amount: i128,
    ) -> Result<u64, Error>;

    /// Approve a pending request and pay out the frozen final amount
    fn approve_withdrawal(env: Env, withdrawal_id: u64) -> Result<(), Error>;

    /// Reject a pending request and refund the full held amount
    fn reject_withdrawal(env: Env, withdrawal_id: u64) -> Result<(), Error>;

    /// Get a withdrawal by id
    fn get_withdrawal(env: Env, withdrawal_id: u64) -> Result<Withdrawal, Error>;

    /// Get all withdrawal ids of a member
    fn get_user_withdrawals(env: Env, user: Address) -> Result<Vec<u64>, Error>;
}

/// Derives unlocked cascade depths
pub trait LevelOperations {
    /// Unlocked depths for both cascades from the live active-direct count
    fn get_unlocked_levels(env: Env, user: Address) -> Result<UnlockedLevels, Error>;
}
