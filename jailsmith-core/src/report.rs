//! Machine-readable plan report (`jailsmith plan --json`).

use crate::planner::Plan;
use crate::policy::{DefaultSection, JailSpec};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PlanReport<'a> {
    pub defaults: &'a DefaultSection,
    pub jails: &'a [JailSpec],
    pub related_filters: &'a [String],
    pub rendered: &'a str,
}

impl<'a> PlanReport<'a> {
    pub fn new(plan: &'a Plan) -> Self {
        Self {
            defaults: &plan.document.defaults,
            jails: &plan.document.jails,
            related_filters: &plan.related_filters,
            rendered: &plan.rendered,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
