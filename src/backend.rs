//! Backend wiring: which store each entity service sits on.

use std::sync::Arc;

use crate::category::Category;
use crate::client::Client;
use crate::fixtures::{Fixtures, NextIds};
use crate::notice::Notices;
use crate::project::Project;
use crate::remote::{RecordsClient, RemoteRecord, RemoteStore};
use crate::service::{CategoryService, ClientService, EntityService, ProjectService, TaskService};
use crate::store::{Latency, MemoryStore, RecordStore};
use crate::task::Task;

/// One service per entity, sharing a notice sink.
#[derive(Clone)]
pub struct Services {
    pub tasks: TaskService,
    pub categories: CategoryService,
    pub clients: ClientService,
    pub projects: ProjectService,
    pub notices: Notices,
}

impl Services {
    /// Services over a remote tabular store.
    pub fn remote(client: Arc<dyn RecordsClient>, notices: Notices) -> Self {
        fn service<R: RemoteRecord>(
            client: &Arc<dyn RecordsClient>,
            notices: &Notices,
        ) -> EntityService<R> {
            let store: Arc<dyn RecordStore<R>> =
                Arc::new(RemoteStore::<R>::new(Arc::clone(client), notices.clone()));
            EntityService::new(store, notices.clone())
        }
        Services {
            tasks: service(&client, &notices),
            categories: service(&client, &notices),
            clients: service(&client, &notices),
            projects: service(&client, &notices),
            notices,
        }
    }
}

/// Owned in-process stores, seeded from fixtures.
pub struct MemoryBackend {
    tasks: Arc<MemoryStore<Task>>,
    categories: Arc<MemoryStore<Category>>,
    clients: Arc<MemoryStore<Client>>,
    projects: Arc<MemoryStore<Project>>,
}

impl MemoryBackend {
    pub fn from_fixtures(fixtures: Fixtures, latency: Latency) -> Self {
        let next = fixtures.next_ids;
        MemoryBackend {
            tasks: Arc::new(MemoryStore::resumed(fixtures.tasks, next.tasks, latency)),
            categories: Arc::new(MemoryStore::resumed(fixtures.categories, next.categories, latency)),
            clients: Arc::new(MemoryStore::resumed(fixtures.clients, next.clients, latency)),
            projects: Arc::new(MemoryStore::resumed(fixtures.projects, next.projects, latency)),
        }
    }

    pub fn services(&self, notices: Notices) -> Services {
        Services {
            tasks: EntityService::new(self.tasks.clone(), notices.clone()),
            categories: EntityService::new(self.categories.clone(), notices.clone()),
            clients: EntityService::new(self.clients.clone(), notices.clone()),
            projects: EntityService::new(self.projects.clone(), notices.clone()),
            notices,
        }
    }

    /// Current contents of every store, with each store's next id.
    pub async fn snapshot(&self) -> Fixtures {
        let ((tasks, next_task), (categories, next_category), (clients, next_client), (projects, next_project)) =
            tokio::join!(
                self.tasks.checkpoint(),
                self.categories.checkpoint(),
                self.clients.checkpoint(),
                self.projects.checkpoint(),
            );
        Fixtures {
            tasks,
            categories,
            clients,
            projects,
            next_ids: NextIds {
                tasks: next_task,
                categories: next_category,
                clients: next_client,
                projects: next_project,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::{ok_data, ScriptedClient};
    use crate::task::TaskDraft;
    use serde_json::json;

    #[tokio::test]
    async fn memory_services_write_through_to_the_snapshot() {
        let backend = MemoryBackend::from_fixtures(Fixtures::builtin().unwrap(), Latency::NONE);
        let services = backend.services(Notices::default());
        let before = backend.snapshot().await.tasks.len();
        let created = services.tasks.create(TaskDraft::titled("Water plants")).await.unwrap();
        let snapshot = backend.snapshot().await;
        assert_eq!(snapshot.tasks.len(), before + 1);
        assert_eq!(snapshot.tasks.last().map(|t| t.id), Some(created.id));
    }

    #[tokio::test]
    async fn remote_services_read_their_own_tables() {
        let client = Arc::new(ScriptedClient::default());
        client.respond(ok_data(json!([{ "Id": 3, "Name": "Acme", "Tags": "vip" }])));
        let services = Services::remote(client.clone(), Notices::default());
        let clients = services.clients.get_all().await;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Acme");
    }
}
