use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const ADDRESS_HEX_LEN: usize = 40;

/// Account or module address, stored lowercase so lookups join regardless of
/// checksum casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const ZERO_STR: &'static str = "0x0000000000000000000000000000000000000000";

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) else {
            return Err(DomainError::InvalidAddress(raw.to_string()));
        };
        if hex.len() != ADDRESS_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn zero() -> Self {
        Self(Self::ZERO_STR.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO_STR
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234...abcd` form used in the member table.
    pub fn short(&self) -> String {
        let s = &self.0;
        format!("{}...{}", &s[..6], &s[s.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const RINKEBY: ChainId = ChainId(4);
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw token amount in base units. Carried as a decimal string on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Renders `value / 10^decimals` keeping at least one fractional digit,
    /// e.g. `2_000_000_000_000_000_000` with 18 decimals is `"2.0"`.
    pub fn format_units(&self, decimals: u32) -> String {
        let digits = self.0.to_string();
        let decimals = decimals as usize;
        let (whole, frac) = if digits.len() > decimals {
            let split = digits.len() - decimals;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            ("0".to_string(), format!("{digits:0>decimals$}"))
        };
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            format!("{whole}.0")
        } else {
            format!("{whole}.{frac}")
        }
    }

    /// Parses a human amount such as `"1000"` or `"42.5"` into base units.
    pub fn parse_units(text: &str, decimals: u32) -> Result<Self, DomainError> {
        let text = text.trim();
        let invalid = || DomainError::InvalidAmount(text.to_string());
        let (whole, frac) = match text.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > decimals as usize {
            return Err(DomainError::TooManyDecimals {
                value: text.to_string(),
                decimals,
            });
        }

        let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_scaled: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = decimals as usize);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_scaled))
            .map(TokenAmount)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse::<u128>()
            .map(TokenAmount)
            .map_err(|_| DomainError::InvalidAmount(value))
    }
}

impl From<TokenAmount> for String {
    fn from(value: TokenAmount) -> Self {
        value.0.to_string()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(TokenId);
string_id_newtype!(ProposalId);

impl TokenId {
    pub fn membership() -> Self {
        Self::new("0")
    }
}

/// Governor lifecycle stage, numbered as the vote module reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProposalStage {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalStage {
    pub fn accepts_votes(self) -> bool {
        self == ProposalStage::Active
    }

    pub fn ready_to_execute(self) -> bool {
        self == ProposalStage::Succeeded
    }
}

impl TryFrom<u8> for ProposalStage {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ProposalStage::Pending,
            1 => ProposalStage::Active,
            2 => ProposalStage::Canceled,
            3 => ProposalStage::Defeated,
            4 => ProposalStage::Succeeded,
            5 => ProposalStage::Queued,
            6 => ProposalStage::Expired,
            7 => ProposalStage::Executed,
            other => return Err(DomainError::UnknownProposalStage(other)),
        })
    }
}

impl From<ProposalStage> for u8 {
    fn from(value: ProposalStage) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VoteType {
    Against,
    For,
    Abstain,
}

impl VoteType {
    /// Choice recorded for a proposal the voter left unselected.
    pub const DEFAULT: VoteType = VoteType::Abstain;
}

impl Default for VoteType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for VoteType {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteType::Against),
            1 => Ok(VoteType::For),
            2 => Ok(VoteType::Abstain),
            other => Err(DomainError::UnknownVoteType(other.to_string())),
        }
    }
}

impl From<VoteType> for u8 {
    fn from(value: VoteType) -> Self {
        value as u8
    }
}

impl FromStr for VoteType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "against" => Ok(VoteType::Against),
            "1" | "for" => Ok(VoteType::For),
            "2" | "abstain" => Ok(VoteType::Abstain),
            other => Err(DomainError::UnknownVoteType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOption {
    #[serde(rename = "type")]
    pub vote_type: VoteType,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: ProposalId,
    pub description: String,
    #[serde(rename = "state")]
    pub stage: ProposalStage,
    pub votes: Vec<VoteOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Injected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: Address,
    pub chain_id: ChainId,
    pub can_sign: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub address: Address,
    pub token_amount: String,
}
