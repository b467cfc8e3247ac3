use crate::helpers::{
    apply_bps, ensure_engine_active, get_user, record_transaction, save_user, verify_admin,
    DAY_SECS,
};
use crate::interface::WithdrawalOperations;
use crate::types::{
    DataKey, Error, Transaction, TransactionKind, Withdrawal, WithdrawalConfig, WithdrawalKind,
    WithdrawalStatus,
};
use soroban_sdk::token::TokenClient;
use soroban_sdk::{Address, Env, Symbol, Vec};

pub struct WithdrawalModule;

impl WithdrawalOperations for WithdrawalModule {
    /// Create a request. The deduction tier, deduction amount and days-held
    /// snapshot are computed here and frozen; approval never recomputes
    /// them. The full requested amount is held out of the wallet until the
    /// request resolves.
    fn request_withdrawal(
        env: Env,
        user: Address,
        kind: WithdrawalKind,
        amount: i128,
    ) -> Result<u64, Error> {
        ensure_engine_active(&env)?;
        user.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let mut user_data = get_user(&env, &user)?;
        if user_data.wallet_balance < amount {
            return Err(Error::InsufficientBalance);
        }

        let now = env.ledger().timestamp();
        let (deduction_bps, days_held, investment_date) = if kind == WithdrawalKind::Principal {
            if user_data.first_investment_date == 0 {
                return Err(Error::NoInvestment);
            }
            let config: WithdrawalConfig = env
                .storage()
                .instance()
                .get(&DataKey::WithdrawalConfig)
                .ok_or(Error::ConfigMissing)?;
            let days_held = (now - user_data.first_investment_date) / DAY_SECS;
            let bps = if days_held < config.tier_boundary_days {
                config.tier_before_bps
            } else {
                config.tier_after_bps
            };
            (bps, days_held, user_data.first_investment_date)
        } else {
            (0, 0, user_data.first_investment_date)
        };

        let deduction_amount = apply_bps(amount, deduction_bps);
        let final_amount = amount - deduction_amount;

        let id = env
            .storage()
            .instance()
            .get::<_, u64>(&DataKey::WithdrawalCounter)
            .unwrap_or(0)
            + 1;
        env.storage()
            .instance()
            .set(&DataKey::WithdrawalCounter, &id);

        let withdrawal = Withdrawal {
            id,
            user: user.clone(),
            kind,
            requested_amount: amount,
            deduction_bps,
            deduction_amount,
            final_amount,
            status: WithdrawalStatus::Pending,
            investment_date,
            days_held,
            requested_at: now,
        };
        env.storage()
            .persistent()
            .set(&DataKey::Withdrawal(id), &withdrawal);

        let mut requests = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::UserWithdrawals(user.clone()))
            .unwrap_or_else(|| Vec::new(&env));
        requests.push_back(id);
        env.storage()
            .persistent()
            .set(&DataKey::UserWithdrawals(user.clone()), &requests);

        user_data.wallet_balance -= amount;
        save_user(&env, &user_data);

        env.events().publish(
            (Symbol::new(&env, "withdrawal_requested"), user, id),
            (amount, final_amount),
        );
        Ok(id)
    }

    /// Approve a pending request and transfer the frozen final amount out.
    /// The status guard makes approve/reject mutually exclusive per record.
    fn approve_withdrawal(env: Env, withdrawal_id: u64) -> Result<(), Error> {
        ensure_engine_active(&env)?;
        verify_admin(&env)?;

        let mut withdrawal: Withdrawal = env
            .storage()
            .persistent()
            .get(&DataKey::Withdrawal(withdrawal_id))
            .ok_or(Error::WithdrawalNotFound)?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(Error::WithdrawalNotPending);
        }
        withdrawal.status = WithdrawalStatus::Approved;
        env.storage()
            .persistent()
            .set(&DataKey::Withdrawal(withdrawal_id), &withdrawal);

        let payout_token: Address = env
            .storage()
            .instance()
            .get(&DataKey::PayoutToken)
            .ok_or(Error::NotInitialized)?;
        let token = TokenClient::new(&env, &payout_token);
        token.transfer(
            &env.current_contract_address(),
            &withdrawal.user,
            &withdrawal.final_amount,
        );

        let mut user_data = get_user(&env, &withdrawal.user)?;
        user_data.total_withdrawal += withdrawal.final_amount;
        save_user(&env, &user_data);

        record_transaction(
            &env,
            &withdrawal.user,
            Transaction {
                kind: TransactionKind::WithdrawalDebit,
                amount: -withdrawal.final_amount,
                counterparty: None,
                level: 0,
                timestamp: env.ledger().timestamp(),
            },
        );

        env.events().publish(
            (Symbol::new(&env, "withdrawal_approved"), withdrawal_id),
            withdrawal.final_amount,
        );
        Ok(())
    }

    /// Reject a pending request. The full pre-deduction hold returns to the
    /// wallet since nothing was paid out.
    fn reject_withdrawal(env: Env, withdrawal_id: u64) -> Result<(), Error> {
        ensure_engine_active(&env)?;
        verify_admin(&env)?;

        let mut withdrawal: Withdrawal = env
            .storage()
            .persistent()
            .get(&DataKey::Withdrawal(withdrawal_id))
            .ok_or(Error::WithdrawalNotFound)?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(Error::WithdrawalNotPending);
        }
        withdrawal.status = WithdrawalStatus::Rejected;
        env.storage()
            .persistent()
            .set(&DataKey::Withdrawal(withdrawal_id), &withdrawal);

        let mut user_data = get_user(&env, &withdrawal.user)?;
        user_data.wallet_balance += withdrawal.requested_amount;
        save_user(&env, &user_data);

        record_transaction(
            &env,
            &withdrawal.user,
            Transaction {
                kind: TransactionKind::WithdrawalRefund,
                amount: withdrawal.requested_amount,
                counterparty: None,
                level: 0,
                timestamp: env.ledger().timestamp(),
            },
        );

        env.events().publish(
            (Symbol::new(&env, "withdrawal_rejected"), withdrawal_id),
            withdrawal.requested_amount,
        );
        Ok(())
    }

    fn get_withdrawal(env: Env, withdrawal_id: u64) -> Result<Withdrawal, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Withdrawal(withdrawal_id))
            .ok_or(Error::WithdrawalNotFound)
    }

    fn get_user_withdrawals(env: Env, user: Address) -> Result<Vec<u64>, Error> {
        Ok(env
            .storage()
            .persistent()
            .get(&DataKey::UserWithdrawals(user))
            .unwrap_or_else(|| Vec::new(&env)))
    }
}
