//! The four HR tools exposed to the model.

use std::fmt::Write;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::directory::{DirectoryError, HrDirectory, MockHrDirectory};
use crate::executor::{ToolCall, ToolError, ToolExecutor, ToolOutput, deserialize_params};
use crate::registry::{ToolDef, ToolRegistry};

pub const GET_VACATION_BALANCE: &str = "get_vacation_balance";
pub const GET_SALARY_INFO: &str = "get_salary_info";
pub const SEARCH_DIRECTORY: &str = "search_directory";
pub const GET_SCHEDULE: &str = "get_schedule";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct EmployeeParams {
    /// Employee ID, e.g. EMP001
    employee_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DirectoryParams {
    /// Search query (name or keyword)
    query: String,
    /// Filter by department
    department: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ScheduleParams {
    /// Employee ID, e.g. EMP001
    employee_id: String,
    /// Date in YYYY-MM-DD format, defaults to today
    date: Option<String>,
}

impl From<DirectoryError> for ToolError {
    fn from(e: DirectoryError) -> Self {
        Self::Execution(e.to_string())
    }
}

fn definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            id: GET_VACATION_BALANCE,
            description: "Get remaining vacation/PTO days for an employee. Requires an employee ID.",
            schema: schemars::schema_for!(EmployeeParams),
        },
        ToolDef {
            id: GET_SALARY_INFO,
            description: "Get salary and compensation details for an employee. Requires an employee ID.",
            schema: schemars::schema_for!(EmployeeParams),
        },
        ToolDef {
            id: SEARCH_DIRECTORY,
            description: "Search the employee directory by name or department.",
            schema: schemars::schema_for!(DirectoryParams),
        },
        ToolDef {
            id: GET_SCHEDULE,
            description: "Get work schedule and upcoming meetings for an employee.",
            schema: schemars::schema_for!(ScheduleParams),
        },
    ]
}

/// Executes HR tool calls against an [`HrDirectory`].
pub struct HrToolExecutor<D = MockHrDirectory> {
    directory: D,
    registry: ToolRegistry,
}

impl Default for HrToolExecutor {
    fn default() -> Self {
        Self::new(MockHrDirectory::new())
    }
}

impl<D: HrDirectory> HrToolExecutor<D> {
    #[must_use]
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            registry: ToolRegistry::from_definitions(definitions()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn vacation_balance(&self, call: &ToolCall) -> Result<String, ToolError> {
        let p: EmployeeParams = deserialize_params(&call.params)?;
        let b = self.directory.vacation_balance(&p.employee_id).await?;
        Ok(format!(
            "{} has {} vacation days remaining out of {} total. {} used, {} pending requests.",
            b.name, b.remaining_days, b.total_days, b.used_days, b.pending_requests
        ))
    }

    async fn salary_info(&self, call: &ToolCall) -> Result<String, ToolError> {
        let p: EmployeeParams = deserialize_params(&call.params)?;
        let info = self.directory.salary_info(&p.employee_id).await?;
        Ok(format!(
            "{}: ${} {}, paid {}. Last raise: {}.",
            info.name,
            group_thousands(info.base_salary),
            info.currency,
            info.pay_frequency.as_str(),
            info.last_raise_date
        ))
    }

    async fn search_directory(&self, call: &ToolCall) -> Result<String, ToolError> {
        let p: DirectoryParams = deserialize_params(&call.params)?;
        let employees = self
            .directory
            .search(&p.query, p.department.as_deref())
            .await?;
        if employees.is_empty() {
            return Ok("No employees found matching the query.".to_owned());
        }
        let mut out = String::new();
        for (i, e) in employees.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(out, "{} - {}, {} ({})", e.name, e.title, e.department, e.email);
        }
        Ok(out)
    }

    async fn schedule(&self, call: &ToolCall) -> Result<String, ToolError> {
        let p: ScheduleParams = deserialize_params(&call.params)?;
        let entries = self
            .directory
            .schedule(&p.employee_id, p.date.as_deref())
            .await?;
        if entries.is_empty() {
            return Ok("No schedule entries found.".to_owned());
        }
        Ok(entries
            .iter()
            .map(|e| {
                format!(
                    "{}-{}: {} ({}) [{}]",
                    e.start_time,
                    e.end_time,
                    e.title,
                    e.location,
                    e.kind.as_str()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl<D: HrDirectory> ToolExecutor for HrToolExecutor<D> {
    fn tool_definitions(&self) -> Vec<ToolDef> {
        self.registry.tools().to_vec()
    }

    async fn execute_tool_call(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        self.registry.validate(&call.tool_id, &call.params)?;
        tracing::debug!(tool = %call.tool_id, "executing tool");

        let summary = match call.tool_id.as_str() {
            GET_VACATION_BALANCE => self.vacation_balance(call).await?,
            GET_SALARY_INFO => self.salary_info(call).await?,
            SEARCH_DIRECTORY => self.search_directory(call).await?,
            GET_SCHEDULE => self.schedule(call).await?,
            other => return Err(ToolError::UnknownTool(other.to_owned())),
        };

        Ok(ToolOutput {
            tool_name: call.tool_id.clone(),
            summary,
        })
    }
}

/// `1234567` -> `"1,234,567"`.
fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
