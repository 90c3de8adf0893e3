use std::fmt;

use crate::model::SwapOutcome;
use crate::service::ServiceError;

/// Lifecycle of a single token within a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Pending,
    CheckingAllowance,
    Approving,
    Swapping,
    Recording,
    Done,
    Skipped,
    Failed,
}

impl TokenState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::CheckingAllowance => "CHECKING_ALLOWANCE",
            Self::Approving => "APPROVING",
            Self::Swapping => "SWAPPING",
            Self::Recording => "RECORDING",
            Self::Done => "DONE",
            Self::Skipped => "SKIPPED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Why a held token was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The chain's native gas token, which the balance source lists by chain id.
    NativeToken,
    InvalidAddress(String),
    Excluded,
    TargetToken,
    Unsupported,
    ZeroBalance,
    /// Already handled earlier in the same batch.
    Duplicate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeToken => f.write_str("native gas token"),
            Self::InvalidAddress(reason) => write!(f, "invalid address ({reason})"),
            Self::Excluded => f.write_str("excluded from swap"),
            Self::TargetToken => f.write_str("already the target token"),
            Self::Unsupported => f.write_str("not available for swap"),
            Self::ZeroBalance => f.write_str("zero balance"),
            Self::Duplicate => f.write_str("listed more than once"),
        }
    }
}

/// Terminal result for one held token.
#[derive(Debug, Clone)]
pub enum TokenOutcome {
    Done(SwapOutcome),
    Skipped(SkipReason),
    Failed(ServiceError),
}

impl TokenOutcome {
    pub fn state(&self) -> TokenState {
        match self {
            Self::Done(_) => TokenState::Done,
            Self::Skipped(_) => TokenState::Skipped,
            Self::Failed(_) => TokenState::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenReport {
    /// Token id exactly as the balance source reported it.
    pub token: String,
    pub symbol: String,
    pub outcome: TokenOutcome,
}

/// Everything a sweep did, one report per held token in balance-source order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<TokenReport>,
}

impl BatchSummary {
    pub fn push(&mut self, report: TokenReport) {
        self.reports.push(report);
    }

    pub fn done(&self) -> usize {
        self.count(TokenState::Done)
    }

    pub fn skipped(&self) -> usize {
        self.count(TokenState::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(TokenState::Failed)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &SwapOutcome> {
        self.reports.iter().filter_map(|report| match &report.outcome {
            TokenOutcome::Done(outcome) => Some(outcome),
            _ => None,
        })
    }

    fn count(&self, state: TokenState) -> usize {
        self.reports
            .iter()
            .filter(|report| report.outcome.state() == state)
            .count()
    }
}
