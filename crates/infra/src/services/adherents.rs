use chrono::NaiveDate;
use tracing::info;

use membership_adherents::{
    Adherent, AdherentInput, Adhesion, ExportRequest, Exported, NewAdhesion, render,
};
use membership_core::{AdherentId, AdhesionId, Page, PageRequest};

use crate::error::ServiceError;
use crate::store::Store;

/// Page size used when walking every member for an export.
const EXPORT_BATCH: u32 = 100;

pub struct AdherentService<S> {
    store: S,
}

impl<S: Store> AdherentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create(&self, input: AdherentInput) -> Result<Adherent, ServiceError> {
        let adherent = Adherent::create(AdherentId::new(), input)?;
        self.store.transaction(|repos| -> Result<_, ServiceError> {
            repos.save_adherent(adherent.clone())?;
            Ok(())
        })?;
        info!(adherent_id = %adherent.id_typed(), "adherent created");
        Ok(adherent)
    }

    pub fn update(&self, id: AdherentId, input: AdherentInput) -> Result<Adherent, ServiceError> {
        self.store.transaction(|repos| -> Result<_, ServiceError> {
            let mut adherent = repos
                .find_adherent(id)?
                .ok_or_else(|| ServiceError::not_found(format!("adherent {id}")))?;
            adherent.update(input)?;
            repos.save_adherent(adherent.clone())?;
            Ok(adherent)
        })
    }

    pub fn get(&self, id: AdherentId) -> Result<Adherent, ServiceError> {
        self.store.read(|repos| -> Result<_, ServiceError> {
            repos
                .find_adherent(id)?
                .ok_or_else(|| ServiceError::not_found(format!("adherent {id}")))
        })
    }

    pub fn list(&self, offset: Option<u32>, limit: Option<u32>) -> Result<Page<Adherent>, ServiceError> {
        let page = PageRequest::new(offset, limit);
        self.store
            .read(|repos| repos.adherents_page(page).map_err(ServiceError::from))
    }

    pub fn search(
        &self,
        criteria: &str,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Page<Adherent>, ServiceError> {
        let page = PageRequest::new(offset, limit);
        self.store.read(|repos| {
            repos
                .search_adherents(criteria, page)
                .map_err(ServiceError::from)
        })
    }

    pub fn delete(&self, id: AdherentId) -> Result<(), ServiceError> {
        self.store.transaction(|repos| -> Result<_, ServiceError> {
            if !repos.delete_adherent(id)? {
                return Err(ServiceError::not_found(format!("adherent {id}")));
            }
            Ok(())
        })?;
        info!(adherent_id = %id, "adherent deleted");
        Ok(())
    }

    /// Record a membership period.
    pub fn add_adhesion(&self, id: AdherentId, input: NewAdhesion) -> Result<Adherent, ServiceError> {
        let adherent = self.store.transaction(|repos| -> Result<_, ServiceError> {
            let mut adherent = repos
                .find_adherent(id)?
                .ok_or_else(|| ServiceError::not_found(format!("adherent {id}")))?;
            adherent.add_adhesion(Adhesion::new(AdhesionId::new(), input));
            repos.save_adherent(adherent.clone())?;
            Ok(adherent)
        })?;
        info!(adherent_id = %id, "adhesion added");
        Ok(adherent)
    }

    /// Render every member (optionally filtered by status) in the requested format.
    pub fn export(&self, request: &ExportRequest, today: NaiveDate) -> Result<Exported, ServiceError> {
        let adherents = self.store.read(|repos| -> Result<_, ServiceError> {
            let mut all = Vec::new();
            let mut page = PageRequest::first(EXPORT_BATCH);
            loop {
                let batch = repos.adherents_page(page)?;
                let more = batch.has_next();
                all.extend(batch.items);
                if !more {
                    break;
                }
                page = page.next();
            }
            Ok(all)
        })?;

        let exported = render(&adherents, request, today)?;
        info!(rows = exported.rows, format = ?request.format, "adherents exported");
        Ok(exported)
    }
}
