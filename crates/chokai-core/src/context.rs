//! Request-scoped context: who is acting, in which fiscal year, under which
//! organization calendar.

use chrono::NaiveDate;

use crate::auth::Session;
use crate::config::{resolve_calendar, CalendarSettings, OrganizationCalendarConfig};
use crate::fiscal::{resolve_fiscal_year, FiscalYear};
use crate::models::MemberId;
use crate::utils::{format_fiscal_period, format_fiscal_year};

#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub identity: Option<MemberId>,
    pub fiscal_year: FiscalYear,
    pub calendar: OrganizationCalendarConfig,
    pub today: NaiveDate,
}

impl RequestContext {
    /// Resolve the working fiscal year once per request. Every query and
    /// mutation of the request uses the same year.
    pub fn resolve<S: CalendarSettings + ?Sized>(
        identity: Option<MemberId>,
        override_year: Option<FiscalYear>,
        settings: &S,
        today: NaiveDate,
    ) -> Self {
        let calendar = resolve_calendar(settings);
        let fiscal_year =
            resolve_fiscal_year(override_year, today, calendar.fiscal_year_start_month);
        Self {
            identity,
            fiscal_year,
            calendar,
            today,
        }
    }

    /// Build from persisted session preferences.
    pub fn from_session<S: CalendarSettings + ?Sized>(
        session: &Session,
        settings: &S,
        today: NaiveDate,
    ) -> Self {
        Self::resolve(
            session.member_id(),
            session.fiscal_year_override(),
            settings,
            today,
        )
    }

    pub fn start_month(&self) -> u32 {
        self.calendar.fiscal_year_start_month
    }

    /// Era label of the working year, e.g. "令和7年".
    pub fn era_label(&self) -> String {
        self.calendar.era().label(self.fiscal_year)
    }

    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.fiscal_year.period(self.start_month())
    }

    /// Heading text, e.g. "2025年度（令和7年度）".
    pub fn heading(&self) -> String {
        format_fiscal_year(self.fiscal_year, &self.calendar.era())
    }

    pub fn period_label(&self) -> String {
        format_fiscal_period(self.fiscal_year, self.start_month())
    }
}
