//! Dashboard entities (database row mappings).

use domain::models::{ChartConfig, DashboardDefinition, UnknownVariant};
use sqlx::FromRow;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Database row mapping for the dashboard table.
#[derive(Debug, Clone, FromRow)]
pub struct DashboardEntity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
}

/// Database row mapping for the chart table.
///
/// `group_by` and `analysis_metric` hold the enum names as stored text.
#[derive(Debug, Clone, FromRow)]
pub struct ChartEntity {
    pub id: Uuid,
    pub dashboard_id: Uuid,
    pub name: String,
    pub group_by: String,
    pub analysis_metric: String,
    pub position: i32,
}

/// Database row mapping for the chart_tag table.
#[derive(Debug, Clone, FromRow)]
pub struct ChartTagEntity {
    pub chart_id: Uuid,
    pub tag_id: Uuid,
}

impl ChartEntity {
    /// Converts the row into a chart configuration scoped to `tags`.
    pub fn into_config(self, tags: BTreeSet<Uuid>) -> Result<ChartConfig, UnknownVariant> {
        Ok(ChartConfig {
            id: self.id,
            name: self.name,
            group_by: self.group_by.parse()?,
            analysis_metric: self.analysis_metric.parse()?,
            included_tags: tags,
        })
    }
}

/// Builds a dashboard definition from its row, chart rows and chart tag rows.
///
/// Charts keep the order they are given in.
pub fn assemble_dashboard(
    dashboard: DashboardEntity,
    charts: Vec<ChartEntity>,
    chart_tags: Vec<ChartTagEntity>,
) -> Result<DashboardDefinition, UnknownVariant> {
    let mut tags_by_chart: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
    for row in chart_tags {
        tags_by_chart.entry(row.chart_id).or_default().insert(row.tag_id);
    }

    let charts = charts
        .into_iter()
        .map(|chart| {
            let tags = tags_by_chart.remove(&chart.id).unwrap_or_default();
            chart.into_config(tags)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardDefinition {
        id: dashboard.id,
        name: dashboard.name,
        charts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{AnalysisMetric, GroupBy};

    fn chart_entity(dashboard_id: Uuid, name: &str, group_by: &str, position: i32) -> ChartEntity {
        ChartEntity {
            id: Uuid::new_v4(),
            dashboard_id,
            name: name.to_string(),
            group_by: group_by.to_string(),
            analysis_metric: "TAG_PERCENTAGE".to_string(),
            position,
        }
    }

    #[test]
    fn test_chart_entity_into_config() {
        let tag = Uuid::new_v4();
        let entity = chart_entity(Uuid::new_v4(), "By Project", "SELF", 0);
        let id = entity.id;

        let config = entity.into_config(BTreeSet::from([tag])).unwrap();

        assert_eq!(config.id, id);
        assert_eq!(config.group_by, GroupBy::Tag);
        assert_eq!(config.analysis_metric, AnalysisMetric::TagPercentage);
        assert!(config.included_tags.contains(&tag));
    }

    #[test]
    fn test_chart_entity_rejects_unknown_grouping() {
        let entity = chart_entity(Uuid::new_v4(), "Odd", "HOUR", 0);
        assert_eq!(
            entity.into_config(BTreeSet::new()),
            Err(UnknownVariant::GroupBy("HOUR".to_string()))
        );
    }

    #[test]
    fn test_assemble_dashboard_keeps_chart_order() {
        let dashboard = DashboardEntity {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            name: "Work Summary".to_string(),
        };
        let by_project = chart_entity(dashboard.id, "By Project", "TAG", 0);
        let daily = chart_entity(dashboard.id, "Daily", "DAY", 1);
        let tag = Uuid::new_v4();
        let chart_tags = vec![ChartTagEntity {
            chart_id: by_project.id,
            tag_id: tag,
        }];

        let definition = assemble_dashboard(dashboard.clone(), vec![by_project, daily], chart_tags).unwrap();

        assert_eq!(definition.id, dashboard.id);
        assert_eq!(definition.name, "Work Summary");
        let names: Vec<_> = definition.charts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["By Project", "Daily"]);
        assert_eq!(definition.charts[0].included_tags, BTreeSet::from([tag]));
        assert!(definition.charts[1].included_tags.is_empty());
    }
}
