/// Guard atomicity under concurrent writers
///
/// Deletes race against task creation on a multi-threaded runtime. Whatever
/// the interleaving, no task may end up pointing at a deleted row.

use std::sync::Arc;
use taskboard_shared::auth::password::Argon2Encoder;
use taskboard_shared::error::ServiceError;
use taskboard_shared::filter::TaskFilter;
use taskboard_shared::models::label::CreateLabel;
use taskboard_shared::models::task::CreateTask;
use taskboard_shared::models::task_status::CreateTaskStatus;
use taskboard_shared::service::Services;
use taskboard_shared::store::memory::MemoryStore;

fn services() -> Arc<Services<MemoryStore>> {
    Arc::new(Services::new(
        Arc::new(MemoryStore::new()),
        Arc::new(Argon2Encoder::with_cost(1024, 1, 1)),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_delete_races_task_creation() {
    for round in 0..20 {
        let services = services();
        let status = services
            .task_statuses
            .create(CreateTaskStatus {
                name: "Contested".to_string(),
                slug: "contested".to_string(),
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let services = Arc::clone(&services);
            handles.push(tokio::spawn(async move {
                services
                    .tasks
                    .create(CreateTask {
                        title: format!("task {}", i),
                        content: None,
                        index: None,
                        assignee_id: None,
                        status: "contested".to_string(),
                        task_label_ids: None,
                    })
                    .await
                    .map(|_| ())
            }));
        }
        let deleter = {
            let services = Arc::clone(&services);
            tokio::spawn(async move { services.task_statuses.delete(status.id).await })
        };

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => created += 1,
                Err(ServiceError::NotFound { .. }) => {}
                Err(other) => panic!("round {}: unexpected error {:?}", round, other),
            }
        }
        let deleted = match deleter.await.unwrap() {
            Ok(()) => true,
            Err(ServiceError::Conflict { .. }) => false,
            Err(other) => panic!("round {}: unexpected error {:?}", round, other),
        };

        let tasks = services.tasks.list(&TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), created);
        if deleted {
            assert!(tasks.iter().all(|t| t.status != "contested"), "round {}", round);
            assert_eq!(services.task_statuses.count().await.unwrap(), 0);
        } else {
            assert!(created > 0, "round {}: conflict without referencing task", round);
            assert!(services.task_statuses.get_by_id(status.id).await.is_ok());
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_label_delete_races_relabeling() {
    let services = services();
    let status = services
        .task_statuses
        .create(CreateTaskStatus {
            name: "Draft".to_string(),
            slug: "draft".to_string(),
        })
        .await
        .unwrap();
    let label = services
        .labels
        .create(CreateLabel {
            name: "urgent".to_string(),
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let services = Arc::clone(&services);
        let slug = status.slug.clone();
        handles.push(tokio::spawn(async move {
            services
                .tasks
                .create(CreateTask {
                    title: format!("labelled {}", i),
                    content: None,
                    index: None,
                    assignee_id: None,
                    status: slug,
                    task_label_ids: Some([label.id].into_iter().collect()),
                })
                .await
        }));
    }
    let deleter = {
        let services = Arc::clone(&services);
        tokio::spawn(async move { services.labels.delete(label.id).await })
    };

    for handle in handles {
        // Lenient label resolution: creation succeeds whether or not the label survived
        handle.await.unwrap().unwrap();
    }
    let deleted = deleter.await.unwrap().is_ok();

    let tasks = services.tasks.list(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 8);
    let labelled = tasks.iter().filter(|t| t.task_label_ids.contains(&label.id)).count();
    if deleted {
        assert_eq!(labelled, 0);
    } else {
        assert!(labelled > 0);
    }
}
