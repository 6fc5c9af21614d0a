//! Employee data source behind the HR tools.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("employee {0} not found")]
    NotFound(String),

    #[error("directory backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub title: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationBalance {
    pub employee_id: String,
    pub name: String,
    pub total_days: u32,
    pub used_days: u32,
    pub remaining_days: u32,
    pub pending_requests: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayFrequency {
    Monthly,
    BiWeekly,
}

impl PayFrequency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::BiWeekly => "bi-weekly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryInfo {
    pub employee_id: String,
    pub name: String,
    pub base_salary: u32,
    pub currency: String,
    pub pay_frequency: PayFrequency,
    pub last_raise_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Meeting,
    Focus,
    Break,
}

impl EntryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Focus => "focus",
            Self::Break => "break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub location: String,
    pub kind: EntryKind,
}

/// Read access to employee records.
pub trait HrDirectory: Send + Sync {
    /// # Errors
    ///
    /// `DirectoryError::NotFound` for an unknown id.
    fn vacation_balance(
        &self,
        employee_id: &str,
    ) -> impl Future<Output = Result<VacationBalance, DirectoryError>> + Send;

    /// # Errors
    ///
    /// `DirectoryError::NotFound` for an unknown id.
    fn salary_info(
        &self,
        employee_id: &str,
    ) -> impl Future<Output = Result<SalaryInfo, DirectoryError>> + Send;

    /// Employees whose name, title, or department contains `query`
    /// (case-insensitive), optionally restricted to one department.
    fn search(
        &self,
        query: &str,
        department: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Employee>, DirectoryError>> + Send;

    /// Schedule entries, optionally only those on `date`. Unknown employees
    /// have an empty schedule.
    fn schedule(
        &self,
        employee_id: &str,
        date: Option<&str>,
    ) -> impl Future<Output = Result<Vec<ScheduleEntry>, DirectoryError>> + Send;
}

const ANNUAL_VACATION_DAYS: u32 = 25;
const MEETING_TITLES: [&str; 5] = [
    "Sprint Planning",
    "Team Standup",
    "1:1 with Manager",
    "Design Review",
    "Retro",
];
const ROOMS: [&str; 5] = ["Room A", "Room B", "Room C", "Zoom", "Desk"];
const KINDS: [EntryKind; 3] = [EntryKind::Meeting, EntryKind::Focus, EntryKind::Break];

struct Seed {
    name: &'static str,
    title: &'static str,
    department: &'static str,
    location: &'static str,
    used_days: u32,
    pending: u32,
    salary: u32,
    frequency: PayFrequency,
    last_raise: &'static str,
    entries: usize,
}

const SEEDS: [Seed; 10] = [
    Seed { name: "Alice Johnson", title: "Senior Software Engineer", department: "Engineering", location: "Berlin", used_days: 7, pending: 1, salary: 125_000, frequency: PayFrequency::Monthly, last_raise: "2025-03-01", entries: 2 },
    Seed { name: "Brian Smith", title: "Marketing Manager", department: "Marketing", location: "Austin", used_days: 12, pending: 0, salary: 98_000, frequency: PayFrequency::BiWeekly, last_raise: "2025-01-15", entries: 3 },
    Seed { name: "Carla Gomez", title: "HR Business Partner", department: "HR", location: "Madrid", used_days: 3, pending: 2, salary: 87_000, frequency: PayFrequency::Monthly, last_raise: "2024-11-01", entries: 1 },
    Seed { name: "David Chen", title: "Financial Analyst", department: "Finance", location: "Toronto", used_days: 18, pending: 0, salary: 92_000, frequency: PayFrequency::BiWeekly, last_raise: "2025-06-01", entries: 4 },
    Seed { name: "Emma Wilson", title: "Account Executive", department: "Sales", location: "London", used_days: 0, pending: 3, salary: 76_000, frequency: PayFrequency::Monthly, last_raise: "2025-02-10", entries: 2 },
    Seed { name: "Farid Haddad", title: "Staff Engineer", department: "Engineering", location: "Dubai", used_days: 22, pending: 1, salary: 148_000, frequency: PayFrequency::Monthly, last_raise: "2024-12-01", entries: 3 },
    Seed { name: "Grace Kim", title: "Content Strategist", department: "Marketing", location: "Seoul", used_days: 9, pending: 0, salary: 71_000, frequency: PayFrequency::BiWeekly, last_raise: "2025-04-20", entries: 1 },
    Seed { name: "Hiro Tanaka", title: "Payroll Specialist", department: "Finance", location: "Osaka", used_days: 15, pending: 2, salary: 68_000, frequency: PayFrequency::Monthly, last_raise: "2025-05-05", entries: 2 },
    Seed { name: "Isabel Rossi", title: "Technical Recruiter", department: "HR", location: "Milan", used_days: 5, pending: 1, salary: 82_000, frequency: PayFrequency::BiWeekly, last_raise: "2024-10-15", entries: 4 },
    Seed { name: "Jamal Brooks", title: "Sales Director", department: "Sales", location: "Chicago", used_days: 11, pending: 0, salary: 135_000, frequency: PayFrequency::Monthly, last_raise: "2025-07-01", entries: 3 },
];

struct Record {
    employee: Employee,
    vacation: VacationBalance,
    salary: SalaryInfo,
    schedule: Vec<ScheduleEntry>,
}

/// Fixed in-process directory of ten employees, `EMP001` through `EMP010`,
/// spread over five departments. Schedules are dated on the day the directory
/// is built.
pub struct MockHrDirectory {
    records: Vec<Record>,
}

impl Default for MockHrDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHrDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::for_date(chrono::Local::now().date_naive())
    }

    #[must_use]
    pub fn for_date(today: chrono::NaiveDate) -> Self {
        let today = today.format("%Y-%m-%d").to_string();
        let records = SEEDS
            .iter()
            .enumerate()
            .map(|(i, seed)| build_record(i, seed, &today))
            .collect();
        Self { records }
    }

    fn find(&self, employee_id: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.employee.id.eq_ignore_ascii_case(employee_id.trim()))
    }

    #[must_use]
    pub fn employees(&self) -> Vec<&Employee> {
        self.records.iter().map(|r| &r.employee).collect()
    }
}

fn build_record(index: usize, seed: &Seed, today: &str) -> Record {
    let id = format!("EMP{:03}", index + 1);
    let email = format!("{}@example.com", seed.name.to_lowercase().replace(' ', "."));

    let schedule = (0..seed.entries)
        .map(|j| {
            let start = 8 + j * 2;
            ScheduleEntry {
                date: today.to_owned(),
                start_time: format!("{start:02}:00"),
                end_time: format!("{:02}:00", start + 1),
                title: MEETING_TITLES[(index + j) % MEETING_TITLES.len()].to_owned(),
                location: ROOMS[(index * 2 + j) % ROOMS.len()].to_owned(),
                kind: KINDS[(index + j) % KINDS.len()],
            }
        })
        .collect();

    Record {
        employee: Employee {
            id: id.clone(),
            name: seed.name.to_owned(),
            email,
            department: seed.department.to_owned(),
            title: seed.title.to_owned(),
            location: seed.location.to_owned(),
        },
        vacation: VacationBalance {
            employee_id: id.clone(),
            name: seed.name.to_owned(),
            total_days: ANNUAL_VACATION_DAYS,
            used_days: seed.used_days,
            remaining_days: ANNUAL_VACATION_DAYS - seed.used_days,
            pending_requests: seed.pending,
        },
        salary: SalaryInfo {
            employee_id: id,
            name: seed.name.to_owned(),
            base_salary: seed.salary,
            currency: "USD".to_owned(),
            pay_frequency: seed.frequency,
            last_raise_date: seed.last_raise.to_owned(),
        },
        schedule,
    }
}

impl HrDirectory for MockHrDirectory {
    async fn vacation_balance(&self, employee_id: &str) -> Result<VacationBalance, DirectoryError> {
        self.find(employee_id)
            .map(|r| r.vacation.clone())
            .ok_or_else(|| DirectoryError::NotFound(employee_id.to_owned()))
    }

    async fn salary_info(&self, employee_id: &str) -> Result<SalaryInfo, DirectoryError> {
        self.find(employee_id)
            .map(|r| r.salary.clone())
            .ok_or_else(|| DirectoryError::NotFound(employee_id.to_owned()))
    }

    async fn search(
        &self,
        query: &str,
        department: Option<&str>,
    ) -> Result<Vec<Employee>, DirectoryError> {
        let q = query.trim().to_lowercase();
        let department = department.map(str::trim).filter(|d| !d.is_empty());
        Ok(self
            .records
            .iter()
            .map(|r| &r.employee)
            .filter(|e| {
                let matches_query = e.name.to_lowercase().contains(&q)
                    || e.title.to_lowercase().contains(&q)
                    || e.department.to_lowercase().contains(&q);
                let matches_dept = department.is_none_or(|d| e.department.eq_ignore_ascii_case(d));
                matches_query && matches_dept
            })
            .cloned()
            .collect())
    }

    async fn schedule(
        &self,
        employee_id: &str,
        date: Option<&str>,
    ) -> Result<Vec<ScheduleEntry>, DirectoryError> {
        let date = date.map(str::trim).filter(|d| !d.is_empty());
        Ok(self
            .find(employee_id)
            .map(|r| {
                r.schedule
                    .iter()
                    .filter(|e| date.is_none_or(|d| e.date == d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
