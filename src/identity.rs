//! Caller identity, recipient credentials and the authorization gate
use super::error::LedgerError;
use bech32::Bech32m;
use std::fmt;

const CREDENTIAL_HRP: &str = "cred";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Anchor,
    Vendor,
    PaymentMaker,
    PaymentChecker,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "assigner",
            Role::Anchor => "Anchor",
            Role::Vendor => "Vendor",
            Role::PaymentMaker => "PaymentMaker",
            Role::PaymentChecker => "PaymentChecker",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "assigner" => Role::Admin,
            "Anchor" => Role::Anchor,
            "Vendor" => Role::Vendor,
            "PaymentMaker" => Role::PaymentMaker,
            "PaymentChecker" => Role::PaymentChecker,
            other => Role::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved `(account, role)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account: String,
    pub role: Role,
}

impl Identity {
    pub fn new(account: impl Into<String>, role: Role) -> Self {
        Self {
            account: account.into(),
            role,
        }
    }

    /// Reads the `account` and `role` attributes of whoever is calling.
    pub fn resolve<P: IdentityProvider + ?Sized>(provider: &P) -> Result<Self, LedgerError> {
        let account = attribute_string(provider, "account")?;
        let role = attribute_string(provider, "role")?;
        Ok(Self::new(account, Role::from(role.as_str())))
    }
}

fn attribute_string<P: IdentityProvider + ?Sized>(
    provider: &P,
    name: &str,
) -> Result<String, LedgerError> {
    let raw = provider.attribute(name)?;
    let value = String::from_utf8(raw)
        .map_err(|_| LedgerError::Identity(format!("attribute {name} is not utf-8")))?;
    if value.is_empty() {
        return Err(LedgerError::Identity(format!("attribute {name} is empty")));
    }
    Ok(value)
}

/// Source of the caller's certificate attributes and decoder of other parties' credentials.
pub trait IdentityProvider {
    fn attribute(&self, name: &str) -> Result<Vec<u8>, LedgerError>;
    fn decode_credential(&self, credential: &str) -> Result<Identity, LedgerError>;
}

/// The portable form of an identity: CBOR `(account, role)` wrapped in bech32m.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Credential {
    #[n(0)]
    pub account: String,
    #[n(1)]
    pub role: String,
}

impl Credential {
    pub fn new(account: impl Into<String>, role: &Role) -> Self {
        Self {
            account: account.into(),
            role: role.as_str().to_string(),
        }
    }

    pub fn encode(&self) -> Result<String, LedgerError> {
        let hrp = bech32::Hrp::parse(CREDENTIAL_HRP)
            .map_err(|e| LedgerError::Identity(e.to_string()))?;
        let payload = minicbor::to_vec(self)?;
        bech32::encode::<Bech32m>(hrp, &payload).map_err(|e| LedgerError::Identity(e.to_string()))
    }

    pub fn decode(encoded: &str) -> Result<Self, LedgerError> {
        let (hrp, payload) = bech32::decode(encoded)
            .map_err(|e| LedgerError::Identity(format!("malformed credential: {e}")))?;
        if hrp.as_str() != CREDENTIAL_HRP {
            return Err(LedgerError::Identity(format!(
                "unexpected credential prefix {}",
                hrp.as_str()
            )));
        }
        let credential: Credential = minicbor::decode(&payload)
            .map_err(|e| LedgerError::Identity(format!("malformed credential: {e}")))?;
        if credential.account.is_empty() || credential.role.is_empty() {
            return Err(LedgerError::Identity("credential is missing account or role".into()));
        }
        Ok(credential)
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.account.clone(), Role::from(self.role.as_str()))
    }
}

/// Identity provider backed by the caller's own credential.
#[derive(Debug, Clone)]
pub struct CertificateIdentity {
    credential: Credential,
}

impl CertificateIdentity {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn from_encoded(encoded: &str) -> Result<Self, LedgerError> {
        Ok(Self::new(Credential::decode(encoded)?))
    }
}

impl IdentityProvider for CertificateIdentity {
    fn attribute(&self, name: &str) -> Result<Vec<u8>, LedgerError> {
        match name {
            "account" => Ok(self.credential.account.as_bytes().to_vec()),
            "role" => Ok(self.credential.role.as_bytes().to_vec()),
            other => Err(LedgerError::Identity(format!("unknown attribute {other}"))),
        }
    }

    fn decode_credential(&self, credential: &str) -> Result<Identity, LedgerError> {
        Credential::decode(credential).map(|c| c.identity())
    }
}

/// Precondition checks for one operation. Each check consumes and returns the
/// gate so they chain with `?`.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    op: &'static str,
}

impl Gate {
    pub fn new(op: &'static str) -> Self {
        Self { op }
    }

    pub fn open(self, settled: bool) -> Result<Self, LedgerError> {
        if settled {
            return Err(LedgerError::denied(self.op, "record is settled"));
        }
        Ok(self)
    }

    pub fn role(self, caller: &Identity, required: &Role) -> Result<Self, LedgerError> {
        if &caller.role != required {
            return Err(LedgerError::denied(
                self.op,
                format!("caller role {} is not {}", caller.role, required),
            ));
        }
        Ok(self)
    }

    pub fn owner(self, caller: &Identity, owner: &str) -> Result<Self, LedgerError> {
        if caller.account != owner {
            return Err(LedgerError::denied(self.op, "caller does not own the record"));
        }
        Ok(self)
    }

    pub fn recipient(self, recipient: &Identity, required: &Role) -> Result<Self, LedgerError> {
        if &recipient.role != required {
            return Err(LedgerError::denied(
                self.op,
                format!("recipient role {} is not {}", recipient.role, required),
            ));
        }
        Ok(self)
    }

    pub fn state(self, holds: bool, expected: &str) -> Result<Self, LedgerError> {
        if !holds {
            return Err(LedgerError::denied(self.op, format!("record is not {expected}")));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_survives_bech32_wrapping() {
        let credential = Credential::new("acct_anchor", &Role::Anchor);
        let encoded = credential.encode().unwrap();
        assert!(encoded.starts_with("cred1"));

        let decoded = Credential::decode(&encoded).unwrap();
        assert_eq!(decoded, credential);
        assert_eq!(decoded.identity().role, Role::Anchor);
    }

    #[test]
    fn garbage_credential_is_an_identity_error() {
        let err = Credential::decode("not-a-credential").unwrap_err();
        assert!(matches!(err, LedgerError::Identity(_)));
    }

    #[test]
    fn provider_resolves_caller() {
        let provider = CertificateIdentity::new(Credential::new("acct_admin", &Role::Admin));
        let caller = Identity::resolve(&provider).unwrap();
        assert_eq!(caller, Identity::new("acct_admin", Role::Admin));
    }

    #[test]
    fn gate_reports_first_unmet_precondition() {
        let caller = Identity::new("a", Role::Vendor);
        let err = Gate::new("probe")
            .open(false)
            .and_then(|g| g.role(&caller, &Role::Anchor))
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(err.to_string().contains("Vendor"));
    }
}
