pub mod alloy;
pub mod contract;
pub mod debank;
pub mod error;
pub mod history;
pub mod ooga_booga;

use ::alloy::primitives::{Address, U256};
use ::alloy::rpc::types::TransactionRequest;
pub use alloy::{AlloyChainRepository, TokenMetadata, signer_from_key};
use async_trait::async_trait;
pub use debank::DebankBalanceSource;
pub use error::RepositoryError;
pub use history::JsonHistoryStore;
pub use ooga_booga::OogaBoogaClient;

use crate::model::{AggregatorToken, HeldToken, SwapRequest, TxReceipt};

pub(crate) type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// On-chain reads and transaction submission for the sweeping wallet.
#[async_trait]
pub trait ChainRepository: Send + Sync {
    /// Retrieves the ERC20 balance of `owner` with a single `balanceOf` call.
    ///
    /// # Arguments
    ///
    /// * `token` - The ERC20 token contract address
    /// * `owner` - The address of the token holder
    ///
    /// # Returns
    ///
    /// * `Ok(U256)` - Balance in the token's smallest unit
    /// * `Err(RepositoryError)` - If the contract call fails or the address is not a valid ERC20 contract
    async fn balance_of(&self, token: Address, owner: Address) -> RepoResult<U256>;

    /// Retrieves symbol and decimals of an ERC20 token contract.
    async fn get_token_metadata(&self, token: Address) -> RepoResult<TokenMetadata>;

    /// Signs and broadcasts `tx` with the configured wallet, then waits for it to be mined.
    ///
    /// A reverted transaction is not an error: it comes back as a receipt with status 0.
    /// Errors are reserved for signing, submission, and receipt timeouts.
    async fn send_transaction(&self, tx: TransactionRequest) -> RepoResult<TxReceipt>;

    /// Address of the signing wallet, if one is configured.
    fn wallet_address(&self) -> Option<Address>;
}

/// Wallet token list provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Lists every token the wallet holds on the configured chain.
    ///
    /// A non-success response or a malformed entry fails the whole call.
    async fn get_wallet_tokens(&self, wallet: Address) -> RepoResult<Vec<HeldToken>>;
}

/// Swap aggregator: route discovery, spending approval, and swap execution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapClient: Send + Sync {
    /// Tokens the aggregator can route.
    async fn get_token_list(&self) -> RepoResult<Vec<AggregatorToken>>;

    /// Amount of `token` that the aggregator's router may currently spend on behalf of `owner`.
    async fn get_allowance(&self, owner: Address, token: Address) -> RepoResult<U256>;

    /// Approves the router to spend `amount` of `token` and waits for the approval to be mined.
    async fn approve(&self, token: Address, amount: U256) -> RepoResult<TxReceipt>;

    /// Fetches a route for `request`, submits it, and waits for the receipt.
    async fn swap(&self, request: &SwapRequest) -> RepoResult<TxReceipt>;
}
