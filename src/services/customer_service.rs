//! Customer service layer.
//!
//! Business rules for registering, editing, listing and exporting customers.

use crate::cache::TimedCache;
use crate::config::Config;
use crate::domain::{Cpf, CustomerId, EmailAddress, PhoneNumber, ValidationError};
use crate::error::{RegistryError, RegistryResult};
use crate::export::customers_to_csv;
use crate::metrics::Metrics;
use crate::models::{
    CardToken, Customer, CustomerDetails, CustomerDraft, CustomerFilter, CustomerPage,
    CustomerQuery, CustomerStats, CustomerStatus, SortSpec,
};
use crate::repositories::CustomerRepository;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use std::sync::Arc;

/// Random bytes behind each card token.
pub const TOKEN_BYTES: usize = 24;

/// Characters of the customer ID that prefix its card token.
pub const TOKEN_PREFIX_LEN: usize = 4;

const STATS_KEY: &str = "customers";

#[async_trait]
pub trait CustomerService: Send + Sync {
    /// One filtered, sorted page of customers plus the total match count.
    async fn list_customers(&self, query: CustomerQuery) -> RegistryResult<CustomerPage>;

    /// A customer with its card token.
    async fn get_customer(&self, id: &str) -> RegistryResult<CustomerDetails>;

    /// The customer registered under a CPF (any punctuation is ignored).
    async fn get_customer_by_doc(&self, doc: &str) -> RegistryResult<Customer>;

    /// Whether a CPF is already registered.
    async fn doc_exists(&self, doc: &str) -> RegistryResult<bool>;

    /// Register a customer and issue its card token. Returns the new ID.
    async fn create_customer(&self, draft: CustomerDraft) -> RegistryResult<CustomerId>;

    /// Edit a customer; `name` and `doc` must be supplied.
    ///
    /// Optional fields left as `None` keep their stored value; an empty
    /// string clears them.
    async fn update_customer(&self, id: &str, draft: CustomerDraft) -> RegistryResult<Customer>;

    async fn delete_customer(&self, id: &str) -> RegistryResult<()>;

    /// Total, active and inactive counts.
    async fn stats(&self) -> RegistryResult<CustomerStats>;

    /// The whole collection as CSV.
    async fn export_csv(&self) -> RegistryResult<String>;
}

pub struct CustomerServiceImpl {
    repository: Arc<dyn CustomerRepository>,
    stats_cache: TimedCache<&'static str, CustomerStats>,
    config: Config,
    metrics: Metrics,
}

impl CustomerServiceImpl {
    pub fn new(repository: Arc<dyn CustomerRepository>, config: &Config, metrics: Metrics) -> Self {
        Self {
            repository,
            stats_cache: TimedCache::with_ttl_secs(config.stats_cache_ttl_seconds),
            config: config.clone(),
            metrics,
        }
    }

    fn parse_id(id: &str) -> RegistryResult<CustomerId> {
        Ok(CustomerId::new(id.trim())?)
    }

    fn required_name(name: Option<&str>) -> Result<String, ValidationError> {
        match name.map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(ValidationError::MissingField("Name")),
        }
    }

    fn required_doc(doc: Option<&str>) -> Result<Cpf, ValidationError> {
        Cpf::new(doc.unwrap_or_default())
    }

    /// Apply the optional draft fields onto `customer`.
    fn apply_optional(customer: &mut Customer, draft: &CustomerDraft) -> RegistryResult<()> {
        if let Some(status) = draft.status {
            customer.status = status;
        }
        if let Some(phone) = draft.phone.as_deref() {
            customer.contact.phone = match phone.trim() {
                "" => None,
                raw => Some(PhoneNumber::new(raw)?.into_inner()),
            };
        }
        if let Some(email) = draft.email.as_deref() {
            customer.contact.email = match email.trim() {
                "" => None,
                raw => Some(EmailAddress::new(raw)?.into_inner()),
            };
        }
        if let Some(url) = draft.image_url.as_deref() {
            customer.image_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
        }
        Ok(())
    }

    /// Card token `<id prefix>-<base64url of TOKEN_BYTES random bytes>`.
    fn issue_token(customer: &Customer) -> RegistryResult<CardToken> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| RegistryError::Other(format!("Random source unavailable: {}", e)))?;

        let token = format!(
            "{}-{}",
            customer.id.short(TOKEN_PREFIX_LEN),
            URL_SAFE_NO_PAD.encode(&bytes)
        );
        Ok(CardToken {
            id: token.clone(),
            token,
            customer_id: customer.id.clone(),
            created_at: customer.created_at.unwrap_or_else(Utc::now),
            expires_at: None,
        })
    }

    fn after_write(&self) {
        self.stats_cache.clear();
        self.metrics.record_customer_written();
    }
}

#[async_trait]
impl CustomerService for CustomerServiceImpl {
    async fn list_customers(&self, query: CustomerQuery) -> RegistryResult<CustomerPage> {
        let filter = CustomerFilter::from_params(
            query.filter_field.as_deref(),
            query.filter_value.as_deref(),
            query.search.as_deref(),
        )?;
        let sort = match query.sort.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<SortSpec>()?,
            _ => SortSpec::default(),
        };
        let offset = query.offset.unwrap_or(0);
        let limit = self.config.page_size(query.page_size);

        if let Some(term) = &filter.keyword {
            tracing::debug!("Keyword search for '{}'", term);
            self.metrics.record_search();
        }

        let (total, customers) = futures::try_join!(
            self.repository.count(&filter),
            self.repository.query(&filter, &sort, offset, limit),
        )?;
        tracing::debug!(
            "Listed {} of {} customers (offset {}, sort {}:{:?})",
            customers.len(),
            total,
            offset,
            sort.field,
            sort.direction
        );

        Ok(CustomerPage::new(customers, offset, limit, total))
    }

    async fn get_customer(&self, id: &str) -> RegistryResult<CustomerDetails> {
        let id = Self::parse_id(id)?;
        let customer = self
            .repository
            .get(&id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("Customer {}", id)))?;

        let token = self
            .repository
            .token_for(&id)
            .await?
            .map(|t| t.token)
            .unwrap_or_default();

        Ok(CustomerDetails { customer, token })
    }

    async fn get_customer_by_doc(&self, doc: &str) -> RegistryResult<Customer> {
        let doc = Cpf::new(doc)?;
        self.repository
            .find_by_doc(&doc)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("Customer with CPF {}", doc)))
    }

    async fn doc_exists(&self, doc: &str) -> RegistryResult<bool> {
        let doc = Cpf::new(doc)?;
        Ok(self.repository.find_by_doc(&doc).await?.is_some())
    }

    async fn create_customer(&self, draft: CustomerDraft) -> RegistryResult<CustomerId> {
        let doc = Self::required_doc(draft.doc.as_deref())
            .map_err(|_| RegistryError::InvalidRequest("CPF is required".to_string()))?;

        if self.repository.find_by_doc(&doc).await?.is_some() {
            tracing::info!("Rejected duplicate CPF on create");
            return Err(RegistryError::Conflict("CPF already registered".to_string()));
        }

        let name = Self::required_name(draft.name.as_deref())?;
        let mut customer = Customer::new(CustomerId::generate(), name, doc);
        Self::apply_optional(&mut customer, &draft)?;

        let now = Utc::now();
        customer.created_at = Some(now);
        customer.updated_at = Some(now);

        let token = Self::issue_token(&customer)?;
        self.repository.create(&customer, &token).await?;
        self.after_write();

        tracing::info!("Created customer {}", customer.id);
        Ok(customer.id)
    }

    async fn update_customer(&self, id: &str, draft: CustomerDraft) -> RegistryResult<Customer> {
        let id = Self::parse_id(id)?;
        let name = Self::required_name(draft.name.as_deref())?;
        let doc = Self::required_doc(draft.doc.as_deref())
            .map_err(|_| RegistryError::InvalidRequest("CPF is required".to_string()))?;

        let mut customer = self
            .repository
            .get(&id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("Customer {}", id)))?;

        if doc != customer.doc {
            if let Some(holder) = self.repository.find_by_doc(&doc).await? {
                if holder.id != id {
                    tracing::info!("Rejected CPF already held by {} on update", holder.id);
                    return Err(RegistryError::Conflict("CPF already registered".to_string()));
                }
            }
        }

        customer.name = name;
        customer.doc = doc;
        Self::apply_optional(&mut customer, &draft)?;
        customer.reindex();
        customer.updated_at = Some(Utc::now());

        self.repository.update(&customer).await?;
        self.after_write();

        tracing::info!("Updated customer {}", customer.id);
        Ok(customer)
    }

    async fn delete_customer(&self, id: &str) -> RegistryResult<()> {
        let id = Self::parse_id(id)?;
        if self.repository.get(&id).await?.is_none() {
            return Err(RegistryError::NotFound(format!("Customer {}", id)));
        }

        self.repository.delete(&id).await?;
        self.after_write();

        tracing::info!("Deleted customer {}", id);
        Ok(())
    }

    async fn stats(&self) -> RegistryResult<CustomerStats> {
        if let Some(stats) = self.stats_cache.get(&STATS_KEY) {
            return Ok(stats);
        }

        // Read before counting so a write landing mid-count keeps its clear.
        let generation = self.stats_cache.generation();
        let everyone = CustomerFilter::default();
        let active = CustomerFilter::equals("status", CustomerStatus::Active.as_str());
        let (total, active) = futures::try_join!(
            self.repository.count(&everyone),
            self.repository.count(&active),
        )?;

        let stats = CustomerStats::new(total, active);
        self.stats_cache.insert_if_current(generation, STATS_KEY, stats);
        Ok(stats)
    }

    async fn export_csv(&self) -> RegistryResult<String> {
        let customers = self.repository.list_all().await?;
        tracing::info!("Exporting {} customers", customers.len());
        customers_to_csv(&customers)
    }
}
