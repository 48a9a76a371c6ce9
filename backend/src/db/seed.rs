//! Default catalog: the three environments and the three resource types the
//! portal ships with.

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::{types::Json, PgPool};

use crate::models::catalog::{Environment, ResourceType};
use crate::types::{EnvironmentId, ResourceTypeId};

pub const DEFAULT_REGION: &str = "asia-southeast1";

fn environment(
    name: &str,
    display_name: &str,
    description: &str,
    requires_approval: bool,
) -> Environment {
    let now = Utc::now();
    Environment {
        id: EnvironmentId::new(),
        name: name.to_string(),
        display_name: display_name.to_string(),
        description: Some(description.to_string()),
        gcp_project_id: None,
        region: DEFAULT_REGION.to_string(),
        requires_approval,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn resource_type(
    name: &str,
    display_name: &str,
    description: &str,
    module_path: &str,
    config_schema: Value,
) -> ResourceType {
    ResourceType {
        id: ResourceTypeId::new(),
        name: name.to_string(),
        display_name: display_name.to_string(),
        description: Some(description.to_string()),
        module_path: module_path.to_string(),
        config_schema,
        base_cost: 0.0,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn default_environments() -> Vec<Environment> {
    vec![
        environment("dev", "Development", "Development environment for testing", false),
        environment(
            "staging",
            "Staging",
            "Staging environment for pre-production testing",
            true,
        ),
        environment("prod", "Production", "Production environment", true),
    ]
}

pub fn default_resource_types() -> Vec<ResourceType> {
    vec![
        resource_type(
            "gke",
            "GKE Cluster",
            "Google Kubernetes Engine cluster",
            "terraform/modules/gke",
            json!({
                "type": "object",
                "properties": {
                    "machine_type": {
                        "type": "string",
                        "title": "Machine Type",
                        "enum": ["e2-standard-2", "e2-standard-4", "e2-standard-8"],
                        "default": "e2-standard-2"
                    },
                    "min_nodes": {
                        "type": "integer",
                        "title": "Minimum Nodes",
                        "minimum": 1,
                        "maximum": 10,
                        "default": 1
                    },
                    "max_nodes": {
                        "type": "integer",
                        "title": "Maximum Nodes",
                        "minimum": 1,
                        "maximum": 50,
                        "default": 5
                    },
                    "create_spot_pool": {
                        "type": "boolean",
                        "title": "Create Spot Node Pool",
                        "default": false
                    }
                },
                "required": ["machine_type", "min_nodes", "max_nodes"]
            }),
        ),
        resource_type(
            "cloudsql",
            "Cloud SQL",
            "Managed PostgreSQL database",
            "terraform/modules/cloudsql",
            json!({
                "type": "object",
                "properties": {
                    "tier": {
                        "type": "string",
                        "title": "Instance Tier",
                        "enum": ["db-f1-micro", "db-g1-small", "db-custom-2-4096", "db-custom-4-8192"],
                        "default": "db-f1-micro"
                    },
                    "disk_size_gb": {
                        "type": "integer",
                        "title": "Disk Size (GB)",
                        "minimum": 10,
                        "maximum": 500,
                        "default": 10
                    },
                    "high_availability": {
                        "type": "boolean",
                        "title": "High Availability",
                        "default": false
                    }
                },
                "required": ["tier", "disk_size_gb"]
            }),
        ),
        resource_type(
            "redis",
            "Memorystore Redis",
            "Managed Redis cache",
            "terraform/modules/memorystore",
            json!({
                "type": "object",
                "properties": {
                    "memory_size_gb": {
                        "type": "integer",
                        "title": "Memory Size (GB)",
                        "minimum": 1,
                        "maximum": 16,
                        "default": 1
                    },
                    "tier": {
                        "type": "string",
                        "title": "Tier",
                        "enum": ["BASIC", "STANDARD_HA"],
                        "default": "BASIC"
                    }
                },
                "required": ["memory_size_gb", "tier"]
            }),
        ),
    ]
}

/// Insert the default catalog, leaving existing rows with the same name untouched.
pub async fn seed_catalog(pool: &PgPool) -> anyhow::Result<()> {
    for env in default_environments() {
        sqlx::query(
            "INSERT INTO environments \
             (id, name, display_name, description, gcp_project_id, region, requires_approval, \
             is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(env.id)
        .bind(&env.name)
        .bind(&env.display_name)
        .bind(&env.description)
        .bind(&env.gcp_project_id)
        .bind(&env.region)
        .bind(env.requires_approval)
        .bind(env.is_active)
        .bind(env.created_at)
        .bind(env.updated_at)
        .execute(pool)
        .await?;
    }

    for rt in default_resource_types() {
        sqlx::query(
            "INSERT INTO resource_types \
             (id, name, display_name, description, module_path, config_schema, base_cost, \
             is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(rt.id)
        .bind(&rt.name)
        .bind(&rt.display_name)
        .bind(&rt.description)
        .bind(&rt.module_path)
        .bind(Json(&rt.config_schema))
        .bind(rt.base_cost)
        .bind(rt.is_active)
        .bind(rt.created_at)
        .execute(pool)
        .await?;
    }

    tracing::info!("Catalog seeded");
    Ok(())
}
