#![no_std]
use soroban_sdk::{contract, contractimpl, Address, Env, Vec};

mod admin;
mod binary;
mod booster;
mod graph;
mod helpers;
mod interface;
mod levels;
mod packages;
mod rewards;
mod roi;
mod types;
mod withdrawal;

use admin::AdminModule;
use binary::BinaryMatchingModule;
use booster::BoosterModule;
use graph::SponsorGraphModule;
use interface::{
    AdminOperations, BinaryOperations, BoosterOperations, GraphOperations, LevelOperations,
    PackageOperations, RewardOperations, RoiOperations, WithdrawalOperations,
};
use levels::LevelUnlockModule;
use packages::PackageModule;
use rewards::RewardModule;
use roi::RoiDistributionModule;
use types::*;
use withdrawal::WithdrawalModule;

#[contract]
pub struct CommissionEngine;

#[contractimpl]
impl CommissionEngine {
    /// Initializes the engine with an admin address and the payout token,
    /// storing default plan, booster, binary, unlock and withdrawal
    /// configuration. The admin becomes the root of the sponsor graph.
    ///
    /// # Arguments
    /// * `admin` - The address of the engine administrator
    /// * `payout_token` - The token held for purchases and payouts
    pub fn initialize(env: Env, admin: Address, payout_token: Address) -> Result<(), Error> {
        AdminModule::initialize(env, admin, payout_token)
    }

    /// get admin address
    pub fn get_admin(env: Env) -> Result<Address, Error> {
        AdminModule::get_admin(env)
    }

    /// Transfers admin rights to a new address
    pub fn transfer_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        AdminModule::transfer_admin(env, new_admin)
    }

    /// Pauses all engine operations
    pub fn pause_engine(env: Env) -> Result<(), Error> {
        AdminModule::pause_engine(env)
    }

    /// Resumes engine operations after being paused
    pub fn resume_engine(env: Env) -> Result<(), Error> {
        AdminModule::resume_engine(env)
    }

    /// Check if engine is paused
    pub fn get_paused_state(env: Env) -> Result<bool, Error> {
        AdminModule::get_paused_state(env)
    }

    /// Toggles an engine feature. Every feature is enabled until toggled.
    ///
    /// # Arguments
    /// * `feature` - The feature to toggle
    /// * `enabled` - The new state
    pub fn set_feature_enabled(env: Env, feature: Feature, enabled: bool) -> Result<(), Error> {
        AdminModule::set_feature_enabled(env, feature, enabled)
    }

    /// Check a feature toggle
    pub fn is_feature_enabled(env: Env, feature: Feature) -> bool {
        AdminModule::is_feature_enabled(env, feature)
    }

    /// Sets the package purchase rules
    pub fn set_plan_config(env: Env, config: PlanConfig) -> Result<(), Error> {
        AdminModule::set_plan_config(env, config)
    }

    /// Sets the per-level rates for the ROI-on-ROI cascade
    ///
    /// # Arguments
    /// * `rates` - Basis points per cascade level, at most 15 entries
    pub fn set_roi_on_roi_rates(env: Env, rates: Vec<u32>) -> Result<(), Error> {
        AdminModule::set_roi_on_roi_rates(env, rates)
    }

    /// Sets the per-level rates for purchase-time level income
    ///
    /// # Arguments
    /// * `rates` - Basis points per cascade level, at most 30 entries
    pub fn set_level_income_rates(env: Env, rates: Vec<u32>) -> Result<(), Error> {
        AdminModule::set_level_income_rates(env, rates)
    }

    /// Sets the directs-to-unlocked-levels step tables for both cascades
    pub fn set_level_unlock_steps(env: Env, steps: LevelUnlockSteps) -> Result<(), Error> {
        AdminModule::set_level_unlock_steps(env, steps)
    }

    /// Sets booster qualification rules
    pub fn set_booster_config(env: Env, config: BoosterConfig) -> Result<(), Error> {
        AdminModule::set_booster_config(env, config)
    }

    /// Sets two-leg matching rules
    pub fn set_binary_config(env: Env, config: BinaryConfig) -> Result<(), Error> {
        AdminModule::set_binary_config(env, config)
    }

    /// Sets principal withdrawal deduction tiers
    pub fn set_withdrawal_config(env: Env, config: WithdrawalConfig) -> Result<(), Error> {
        AdminModule::set_withdrawal_config(env, config)
    }

    /// Adds a reward milestone paid against qualified 3-leg volume
    ///
    /// # Arguments
    /// * `required_volume` - Qualified volume needed to earn the milestone
    /// * `reward_amount` - Amount credited on achievement
    pub fn add_reward_milestone(
        env: Env,
        required_volume: i128,
        reward_amount: i128,
    ) -> Result<u32, Error> {
        AdminModule::add_reward_milestone(env, required_volume, reward_amount)
    }

    /// Removes a reward milestone
    pub fn remove_reward_milestone(env: Env, milestone_id: u32) -> Result<(), Error> {
        AdminModule::remove_reward_milestone(env, milestone_id)
    }

    /// Gets the package purchase rules
    pub fn get_plan_config(env: Env) -> Result<PlanConfig, Error> {
        AdminModule::get_plan_config(env)
    }

    /// Gets the ROI-on-ROI rate table
    pub fn get_roi_on_roi_rates(env: Env) -> Result<Vec<u32>, Error> {
        AdminModule::get_roi_on_roi_rates(env)
    }

    /// Gets the level-income rate table
    pub fn get_level_income_rates(env: Env) -> Result<Vec<u32>, Error> {
        AdminModule::get_level_income_rates(env)
    }

    /// Gets the unlock step tables
    pub fn get_level_unlock_steps(env: Env) -> Result<LevelUnlockSteps, Error> {
        AdminModule::get_level_unlock_steps(env)
    }

    /// Gets the booster qualification rules
    pub fn get_booster_config(env: Env) -> Result<BoosterConfig, Error> {
        AdminModule::get_booster_config(env)
    }

    /// Gets the two-leg matching rules
    pub fn get_binary_config(env: Env) -> Result<BinaryConfig, Error> {
        AdminModule::get_binary_config(env)
    }

    /// Gets the principal withdrawal deduction tiers
    pub fn get_withdrawal_config(env: Env) -> Result<WithdrawalConfig, Error> {
        AdminModule::get_withdrawal_config(env)
    }

    /// Gets every configured reward milestone
    pub fn get_reward_milestones(env: Env) -> Vec<RewardMilestone> {
        AdminModule::get_reward_milestones(env)
    }

    /// Registers a new member under a sponsor
    ///
    /// # Arguments
    /// * `user` - The address of the new member
    /// * `sponsor` - The address of the sponsoring member
    pub fn register_user(env: Env, user: Address, sponsor: Address) -> Result<(), Error> {
        SponsorGraphModule::register_user(env, user, sponsor)
    }

    /// Retrieves a member's record
    pub fn get_user_info(env: Env, user: Address) -> Result<UserData, Error> {
        SponsorGraphModule::get_user_info(env, user)
    }

    /// Ordered ancestors of a member, depth 1 being the direct sponsor,
    /// bounded at 30 depths
    pub fn get_upline_chain(env: Env, user: Address) -> Result<Vec<(Address, u32)>, Error> {
        SponsorGraphModule::get_upline_chain(env, user)
    }

    /// Counts directs that hold at least one active package
    pub fn get_directs_with_active_package(env: Env, user: Address) -> Result<u32, Error> {
        SponsorGraphModule::get_directs_with_active_package(env, user)
    }

    /// Every member below a member in the sponsor graph
    pub fn get_all_downline(env: Env, user: Address) -> Result<Vec<Address>, Error> {
        SponsorGraphModule::get_all_downline(env, user)
    }

    /// Places a member into the two-leg tree. Rejects occupied slots,
    /// double placement and cycles.
    ///
    /// # Arguments
    /// * `user` - The member to place
    /// * `parent` - The tree parent
    /// * `position` - Which leg of the parent to fill
    pub fn place_binary(env: Env, user: Address, parent: Address, position: Leg) -> Result<(), Error> {
        SponsorGraphModule::place_binary(env, user, parent, position)
    }

    /// Retrieves a member's placement-tree node
    pub fn get_binary_node(env: Env, user: Address) -> Result<BinaryNode, Error> {
        SponsorGraphModule::get_binary_node(env, user)
    }

    /// Buys a package for a member. The amount must be a multiple of the
    /// plan base amount and inside the plan bounds; the principal moves into
    /// contract custody. Starts the booster countdown on a first purchase
    /// and cascades level income to the upline.
    ///
    /// # Arguments
    /// * `user` - The purchasing member
    /// * `amount` - The principal to invest
    pub fn purchase_package(env: Env, user: Address, amount: i128) -> Result<u64, Error> {
        PackageModule::purchase_package(env, user, amount)
    }

    /// Retrieves a package by id
    pub fn get_package(env: Env, package_id: u64) -> Result<Package, Error> {
        PackageModule::get_package(env, package_id)
    }

    /// Gets all package ids owned by a member
    pub fn get_user_packages(env: Env, user: Address) -> Result<Vec<u64>, Error> {
        PackageModule::get_user_packages(env, user)
    }

    /// Unlocked cascade depths for a member, derived from the live
    /// active-direct count
    pub fn get_unlocked_levels(env: Env, user: Address) -> Result<UnlockedLevels, Error> {
        LevelUnlockModule::get_unlocked_levels(env, user)
    }

    /// Runs the daily distribution over every active package: base ROI up
    /// to each package's ceiling, booster bonus where achieved, and the
    /// ROI-on-ROI cascade up each owner's sponsor chain. Safe to re-run
    /// within the same day.
    pub fn distribute_daily_roi(env: Env) -> Result<RoiRunSummary, Error> {
        RoiDistributionModule::distribute_daily_roi(env)
    }

    /// Retrieves a member's booster
    pub fn get_booster(env: Env, user: Address) -> Result<Booster, Error> {
        BoosterModule::get_booster(env, user)
    }

    /// Recomputes a member's active-direct count and achieves the booster
    /// if the target is met inside the window
    pub fn refresh_booster_directs(env: Env, user: Address) -> Result<(), Error> {
        BoosterModule::refresh_booster_directs(env, user)
    }

    /// Expires every active booster past its window
    pub fn expire_boosters(env: Env) -> Result<u32, Error> {
        BoosterModule::expire_boosters(env)
    }

    /// Runs the two-leg matching bonus over every placed member
    pub fn distribute_binary_matching(env: Env) -> Result<BinaryRunSummary, Error> {
        BinaryMatchingModule::distribute_binary_matching(env)
    }

    /// Qualifies and pays 3-leg reward milestones for a closed calendar
    /// month
    ///
    /// # Arguments
    /// * `month` - Calendar month, 1 to 12
    /// * `year` - Calendar year
    pub fn distribute_monthly_rewards(
        env: Env,
        month: u32,
        year: u32,
    ) -> Result<RewardRunSummary, Error> {
        RewardModule::distribute_monthly_rewards(env, month, year)
    }

    /// Retrieves a member's closed-period leg volumes
    pub fn get_business_volume(
        env: Env,
        user: Address,
        month: u32,
        year: u32,
    ) -> Result<BusinessVolume, Error> {
        RewardModule::get_business_volume(env, user, month, year)
    }

    /// Creates a withdrawal request with deduction figures frozen at
    /// request time. The requested amount is held out of the wallet until
    /// the request resolves.
    ///
    /// # Arguments
    /// * `user` - The requesting member
    /// * `kind` - The earnings category being withdrawn
    /// * `amount` - The amount requested before deduction
    pub fn request_withdrawal(
        env: Env,
        user: Address,
        kind: WithdrawalKind,
        amount: i128,
    ) -> Result<u64, Error> {
        WithdrawalModule::request_withdrawal(env, user, kind, amount)
    }

    /// Approves a pending withdrawal and pays out the frozen final amount
    pub fn approve_withdrawal(env: Env, withdrawal_id: u64) -> Result<(), Error> {
        WithdrawalModule::approve_withdrawal(env, withdrawal_id)
    }

    /// Rejects a pending withdrawal and refunds the full held amount
    pub fn reject_withdrawal(env: Env, withdrawal_id: u64) -> Result<(), Error> {
        WithdrawalModule::reject_withdrawal(env, withdrawal_id)
    }

    /// Retrieves a withdrawal by id
    pub fn get_withdrawal(env: Env, withdrawal_id: u64) -> Result<Withdrawal, Error> {
        WithdrawalModule::get_withdrawal(env, withdrawal_id)
    }

    /// Gets all withdrawal ids of a member
    pub fn get_user_withdrawals(env: Env, user: Address) -> Result<Vec<u64>, Error> {
        WithdrawalModule::get_user_withdrawals(env, user)
    }

    /// Gets a member's ledger rows
    pub fn get_transactions(env: Env, user: Address) -> Vec<Transaction> {
        env.storage()
            .persistent()
            .get(&DataKey::Transactions(user))
            .unwrap_or_else(|| Vec::new(&env))
    }

    /// Gets a member's cascade payout rows
    pub fn get_payouts(env: Env, user: Address) -> Vec<Payout> {
        env.storage()
            .persistent()
            .get(&DataKey::Payouts(user))
            .unwrap_or_else(|| Vec::new(&env))
    }

    /// Gets a member's commission reporting rows
    pub fn get_commissions(env: Env, user: Address) -> Vec<Commission> {
        env.storage()
            .persistent()
            .get(&DataKey::Commissions(user))
            .unwrap_or_else(|| Vec::new(&env))
    }

    /// Gets the total number of registered members
    pub fn get_total_users(env: Env) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::TotalUsers)
            .unwrap_or(0)
    }

    /// Gets the lifetime amount credited across every earnings category
    pub fn get_total_distributed(env: Env) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::TotalDistributed)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod test;
