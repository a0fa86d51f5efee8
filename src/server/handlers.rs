//! MCP tool handlers for the customer registry.
//!
//! This module implements all the MCP tools using the rmcp SDK's tool_router pattern.

use crate::config::Config;
use crate::domain::Cpf;
use crate::metrics::Metrics;
use crate::models::{CustomerDraft, CustomerQuery, CustomerStatus};
use crate::repositories::CustomerRepository;
use crate::search::{generate_keywords, normalize};
use crate::services::{CustomerService, CustomerServiceImpl};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// The MCP server exposing customer registry tools.
#[derive(Clone)]
pub struct CustomerRegistryServer {
    customer_service: Arc<dyn CustomerService>,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for CustomerRegistryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "customer-registry-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some("MCP server for an NGO customer registry - register, search, edit and export customers identified by CPF. Searches match name/CPF prefixes, whole words and word phrases.".into()),
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct ListCustomersParams {
    /// Free text; matches word prefixes, whole words and phrases of name or CPF
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    offset: Option<usize>,
    /// Page size
    #[serde(default)]
    size: Option<usize>,
    /// Flat field name such as `status` or `contact_email`; `all` disables the filter
    #[serde(default)]
    filter_field: Option<String>,
    /// Exact value for `filter_field`; empty means the field must be non-empty
    #[serde(default)]
    filter_value: Option<String>,
    /// `field:asc` or `field:desc` (default `name:asc`)
    #[serde(default)]
    sort: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CustomerIdParams {
    customer_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DocumentParams {
    /// CPF, with or without punctuation
    doc: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct CustomerFieldsParams {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    doc: Option<String>,
    /// `active` or `inactive`
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl CustomerFieldsParams {
    fn into_draft(self) -> Result<CustomerDraft, McpError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<CustomerStatus>)
            .transpose()
            .map_err(to_mcp_error)?;

        Ok(CustomerDraft {
            name: self.name,
            doc: self.doc,
            status,
            phone: self.phone,
            email: self.email,
            image_url: self.image_url,
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateCustomerParams {
    customer_id: String,
    #[serde(flatten)]
    fields: CustomerFieldsParams,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NormalizeParams {
    text: String,
}

#[derive(Debug, Serialize)]
struct DocumentReport {
    doc: String,
    formatted: String,
    valid: bool,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

fn to_mcp_error(e: impl std::fmt::Display) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(e.to_string()),
        data: None,
    }
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(to_mcp_error)?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl CustomerRegistryServer {
    /// Build the server and its service from a repository.
    pub fn new(repository: Arc<dyn CustomerRepository>, config: &Config, metrics: Metrics) -> Self {
        let service = Arc::new(CustomerServiceImpl::new(repository, config, metrics))
            as Arc<dyn CustomerService>;
        Self::with_service(service)
    }

    /// Build the server around an existing service.
    pub fn with_service(customer_service: Arc<dyn CustomerService>) -> Self {
        Self {
            customer_service,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "List customers with optional keyword search, field filter, sort and offset pagination. Returns the page, the total match count and the offset of the next page (null on the last page)."
    )]
    async fn list_customers(
        &self,
        params: Parameters<ListCustomersParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = CustomerQuery {
            search: params.search,
            offset: params.offset,
            page_size: params.size,
            filter_field: params.filter_field,
            filter_value: params.filter_value,
            sort: params.sort,
        };

        let page = self
            .customer_service
            .list_customers(query)
            .await
            .map_err(to_mcp_error)?;
        json_result(&page)
    }

    #[tool(description = "Get a customer by ID, including the customer's card token")]
    async fn get_customer(
        &self,
        params: Parameters<CustomerIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let details = self
            .customer_service
            .get_customer(&params.0.customer_id)
            .await
            .map_err(to_mcp_error)?;
        json_result(&details)
    }

    #[tool(description = "Find the customer registered under a CPF")]
    async fn get_customer_by_document(
        &self,
        params: Parameters<DocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let customer = self
            .customer_service
            .get_customer_by_doc(&params.0.doc)
            .await
            .map_err(to_mcp_error)?;
        json_result(&customer)
    }

    #[tool(description = "Check whether a CPF is already registered")]
    async fn check_document_exists(
        &self,
        params: Parameters<DocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let doc = Cpf::new(&params.0.doc).map_err(to_mcp_error)?;
        let exists = self
            .customer_service
            .doc_exists(doc.as_str())
            .await
            .map_err(to_mcp_error)?;
        json_result(&serde_json::json!({ "doc": doc, "exists": exists }))
    }

    #[tool(
        description = "Validate a CPF's check digits and report its formatted form and whether it is already registered"
    )]
    async fn validate_document(
        &self,
        params: Parameters<DocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let doc = Cpf::new(&params.0.doc).map_err(to_mcp_error)?;
        let problem = Cpf::parse_valid(&params.0.doc).err().map(|e| e.to_string());
        let exists = self
            .customer_service
            .doc_exists(doc.as_str())
            .await
            .map_err(to_mcp_error)?;

        json_result(&DocumentReport {
            formatted: doc.formatted(),
            valid: problem.is_none(),
            doc: doc.into_inner(),
            exists,
            problem,
        })
    }

    #[tool(
        description = "Register a customer. `doc` (CPF) and `name` are required; a CPF can only be registered once. A card token is issued with the record. Returns the new ID."
    )]
    async fn create_customer(
        &self,
        params: Parameters<CustomerFieldsParams>,
    ) -> Result<CallToolResult, McpError> {
        let draft = params.0.into_draft()?;
        let id = self
            .customer_service
            .create_customer(draft)
            .await
            .map_err(to_mcp_error)?;
        json_result(&serde_json::json!({ "id": id }))
    }

    #[tool(
        description = "Update a customer. `name` and `doc` are required; omitted optional fields keep their value and empty strings clear them. Search keywords are recomputed. A CPF held by another customer is rejected."
    )]
    async fn update_customer(
        &self,
        params: Parameters<UpdateCustomerParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let draft = params.fields.into_draft()?;
        let customer = self
            .customer_service
            .update_customer(&params.customer_id, draft)
            .await
            .map_err(to_mcp_error)?;
        json_result(&customer)
    }

    #[tool(description = "Delete a customer by ID")]
    async fn delete_customer(
        &self,
        params: Parameters<CustomerIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.0.customer_id;
        self.customer_service
            .delete_customer(&id)
            .await
            .map_err(to_mcp_error)?;
        json_result(&serde_json::json!({ "message": "Customer deleted", "id": id }))
    }

    #[tool(description = "Total, active and inactive customer counts")]
    async fn get_customer_stats(&self) -> Result<CallToolResult, McpError> {
        let stats = self
            .customer_service
            .stats()
            .await
            .map_err(to_mcp_error)?;
        json_result(&stats)
    }

    #[tool(
        description = "Export all customers as CSV (Nome, CPF, Telefone, E-mail, Criado em), suitable for customers.csv"
    )]
    async fn export_customers_csv(&self) -> Result<CallToolResult, McpError> {
        let csv = self
            .customer_service
            .export_csv()
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(csv)]))
    }

    #[tool(
        description = "Show how text is normalized for search and which keywords it would be indexed under"
    )]
    async fn normalize_search_term(
        &self,
        params: Parameters<NormalizeParams>,
    ) -> Result<CallToolResult, McpError> {
        let text = params.0.text;
        let keywords: Vec<String> = generate_keywords(&text).into_iter().collect();
        json_result(&serde_json::json!({
            "normalized": normalize(&text),
            "keywords": keywords,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryCustomerRepository;

    fn server() -> CustomerRegistryServer {
        CustomerRegistryServer::new(
            Arc::new(InMemoryCustomerRepository::new()),
            &Config::default(),
            Metrics::new(),
        )
    }

    fn text_of(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    fn json_of(result: &CallToolResult) -> serde_json::Value {
        serde_json::from_str(&text_of(result)).unwrap()
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "customer-registry-mcp");
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_create_then_search_through_tools() {
        let server = server();
        let created = server
            .create_customer(Parameters(CustomerFieldsParams {
                name: Some("Ana Paula".into()),
                doc: Some("123.456.789-01".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        let id = json_of(&created)["id"].as_str().unwrap().to_string();

        let listed = server
            .list_customers(Parameters(ListCustomersParams {
                search: Some("Pau".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        let page = json_of(&listed);
        assert_eq!(page["totalCustomers"], 1);
        assert_eq!(page["customers"][0]["id"], id.as_str());
        assert!(page["newOffset"].is_null());

        let fetched = server
            .get_customer(Parameters(CustomerIdParams { customer_id: id }))
            .await
            .unwrap();
        assert!(json_of(&fetched)["token"].as_str().unwrap().len() > 5);
    }

    #[tokio::test]
    async fn test_validate_document_reports_check_digits() {
        let server = server();
        let result = server
            .validate_document(Parameters(DocumentParams {
                doc: "529.982.247-25".into(),
            }))
            .await
            .unwrap();
        let report = json_of(&result);
        assert_eq!(report["doc"], "52998224725");
        assert_eq!(report["formatted"], "529.982.247-25");
        assert_eq!(report["valid"], true);
        assert_eq!(report["exists"], false);
        assert!(report.get("problem").is_none());

        let result = server
            .validate_document(Parameters(DocumentParams {
                doc: "529.982.247-26".into(),
            }))
            .await
            .unwrap();
        let report = json_of(&result);
        assert_eq!(report["valid"], false);
        assert_eq!(report["problem"], "Invalid CPF: 529.982.247-26");
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected() {
        let server = server();
        let err = server
            .create_customer(Parameters(CustomerFieldsParams {
                name: Some("Ana".into()),
                doc: Some("12345678909".into()),
                status: Some("archived".into()),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("archived"));
    }

    #[tokio::test]
    async fn test_normalize_search_term() {
        let result = server()
            .normalize_search_term(Parameters(NormalizeParams {
                text: "  João ".into(),
            }))
            .await
            .unwrap();
        let value = json_of(&result);
        assert_eq!(value["normalized"], "joao");
        assert!(value["keywords"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("jo")));
    }

    #[tokio::test]
    async fn test_export_empty_registry_errors() {
        let err = server().export_customers_csv().await.unwrap_err();
        assert!(err.message.contains("No data available"));
    }
}
