//! Replaces the sample owners' todos with a fixed demo set.

use anyhow::Result;
use chrono::{Duration, Utc};

use todo_api::application::todo_service::{TodoService, TodoServiceImpl};
use todo_api::config::Config;
use todo_api::domain::{repository::TodoRepository, todo::{OwnerId, TodoStatus}, validation::TodoInput};
use todo_api::infrastructure::sqlite_repo::SqliteTodoRepository;
use todo_api::telemetry;

struct Sample {
    owner: &'static str,
    title: &'static str,
    description: &'static str,
    status: TodoStatus,
    category: &'static str,
    due_in_days: i64,
}

const SAMPLES: [Sample; 6] = [
    Sample { owner: "john@example.com", title: "Complete project proposal", description: "Write a detailed project proposal for the new client", status: TodoStatus::InProgress, category: "Work", due_in_days: 3 },
    Sample { owner: "john@example.com", title: "Buy groceries", description: "Milk, bread, eggs, and vegetables", status: TodoStatus::Pending, category: "Personal", due_in_days: 1 },
    Sample { owner: "john@example.com", title: "Call dentist", description: "Schedule annual checkup", status: TodoStatus::Pending, category: "Health", due_in_days: 7 },
    Sample { owner: "john@example.com", title: "Review code changes", description: "Review pull request #123 for the authentication module", status: TodoStatus::Completed, category: "Work", due_in_days: -1 },
    Sample { owner: "jane@example.com", title: "Plan weekend trip", description: "Research destinations and book accommodation", status: TodoStatus::Pending, category: "Personal", due_in_days: 14 },
    Sample { owner: "jane@example.com", title: "Update resume", description: "Add recent projects and skills", status: TodoStatus::InProgress, category: "Career", due_in_days: 5 },
];

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init();

    let config = Config::from_env()?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);

    for owner in ["john@example.com", "jane@example.com"] {
        let removed = service.repository().delete_all(&OwnerId::new(owner)).await?;
        tracing::info!(owner, removed, "cleared existing todos");
    }

    let now = Utc::now();
    for sample in &SAMPLES {
        let input = TodoInput::titled(sample.title)
            .with_description(sample.description)
            .with_status(sample.status)
            .with_category(sample.category)
            .with_due_date(now + Duration::days(sample.due_in_days));
        service.create(&OwnerId::new(sample.owner), input).await?;
    }

    tracing::info!(count = SAMPLES.len(), database = %config.database_url, "database seeded");
    println!("Sample owners (send as the {} header): john@example.com, jane@example.com", config.auth_header);
    Ok(())
}
