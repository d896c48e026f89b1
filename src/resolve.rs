use std::collections::HashMap;

use anyhow::Result;

use crate::domain::Transaction;
use crate::error::IngestError;

/// One entry of the external account directory.
#[derive(Debug, Clone)]
pub struct AccountRef {
    pub id: i64,
    pub institution: String,
    pub label: String,
}

/// Remote account directory. Creation must be idempotent server-side on
/// (institution, label).
pub trait AccountDirectory {
    async fn list_accounts(&self) -> Result<Vec<AccountRef>>;
    async fn create_account(&self, label: &str, institution: &str) -> Result<i64>;
}

/// Maps a parsed (institution, raw label) pair to an internal account id.
/// The lookup table is built fresh per run from the directory listing; ids
/// created by auto-provisioning are recorded back into it so the same label
/// is provisioned at most once per run.
pub struct AccountResolver {
    table: HashMap<String, i64>,
    overrides: HashMap<String, String>,
    default_account: Option<i64>,
    auto_create: bool,
}

impl AccountResolver {
    pub fn new(
        accounts: &[AccountRef],
        overrides: HashMap<String, String>,
        default_account: Option<i64>,
        auto_create: bool,
    ) -> Self {
        let mut table = HashMap::with_capacity(accounts.len());
        for account in accounts {
            if account.label.is_empty() {
                continue;
            }
            table.insert(key(&account.institution, &account.label), account.id);
        }

        Self {
            table,
            overrides,
            default_account,
            auto_create,
        }
    }

    /// Statement-printed labels arrive masked, e.g. `************0000`.
    pub fn normalize_label(raw: &str) -> &str {
        raw.trim_start_matches('*')
    }

    /// Writes `account_id` exactly once. Errors other than `Remote` mean the
    /// transaction is dropped and an operator has to add an account or an
    /// override entry.
    pub async fn resolve<D: AccountDirectory>(
        &mut self,
        directory: &D,
        tx: &mut Transaction,
    ) -> Result<(), IngestError> {
        let label = Self::normalize_label(&tx.account_label);

        if label.is_empty() {
            return match self.default_account {
                Some(id) => {
                    tx.account_id = Some(id);
                    Ok(())
                }
                None => Err(IngestError::NoAccount),
            };
        }

        let label = self
            .overrides
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_owned());

        if let Some(&id) = self.table.get(&key(&tx.institution, &label)) {
            tx.account_id = Some(id);
            return Ok(());
        }

        if self.auto_create {
            let id = directory
                .create_account(&label, &tx.institution)
                .await
                .map_err(IngestError::Remote)?;
            self.table.insert(key(&tx.institution, &label), id);
            tx.account_id = Some(id);
            return Ok(());
        }

        match self.default_account {
            Some(id) => {
                tx.account_id = Some(id);
                Ok(())
            }
            None => Err(IngestError::UnrecognizedAccount {
                institution: tx.institution.clone(),
                label,
            }),
        }
    }
}

fn key(institution: &str, label: &str) -> String {
    format!(
        "{}-{}",
        institution.to_lowercase(),
        label.to_lowercase()
    )
}
