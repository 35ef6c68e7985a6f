//! Application wiring for the `ratbike` binary.
//!
//! `App` owns the repository and turns each parsed `Command` into repository
//! calls plus the text to print. This is the part of the program that decides
//! which bikes to show, validates new bikes and reports loading errors.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ratbike_core::{
    Bike, BikesDataSource, BikesFilter, BikesRepository, Config, JsonFileDataSource,
    RemoteDataSource,
};
use tracing::{debug, info, warn};

use crate::command::{BikeFields, Command};
use crate::render;

pub type Repository = BikesRepository<RemoteDataSource, Arc<JsonFileDataSource>>;

pub struct App {
    repository: Repository,
    local: Arc<JsonFileDataSource>,
}

impl App {
    /// Build the repository from the user's config.
    pub async fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        Self::from_config(&config).await
    }

    /// The simulated remote starts as a copy of the local store so that a
    /// refresh does not throw away bikes saved in earlier runs. Only when no
    /// store has ever been written does it start from the sample bikes (if
    /// enabled); an emptied store stays empty.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        debug!(?data_dir, "Data directory configured");
        let local = Arc::new(JsonFileDataSource::new(&data_dir)?);

        let latency = config.remote_latency();
        let remote = if local.exists() {
            let bikes = local.list().await.unwrap_or_default();
            RemoteDataSource::with_bikes(latency, bikes)
        } else if config.seed_remote {
            info!("No local store yet, seeding remote with sample bikes");
            RemoteDataSource::with_sample_data(latency)
        } else {
            RemoteDataSource::new(latency)
        };

        Ok(Self::with_sources(remote, local))
    }

    pub fn with_sources(remote: RemoteDataSource, local: Arc<JsonFileDataSource>) -> Self {
        Self {
            repository: BikesRepository::new(remote, Arc::clone(&local)),
            local,
        }
    }

    pub async fn run(&self, command: Command) -> Result<String> {
        debug!(?command, "Running command");
        match command {
            Command::List { filter } => self.list(filter).await,
            Command::Refresh { filter } => {
                self.repository.invalidate().await;
                self.list(filter).await
            }
            Command::Show { id } => {
                // Full ids go straight to the repository, prefixes need the list
                let bike = match self.repository.get(&id).await {
                    Ok(bike) => bike,
                    Err(_) => self.resolve(&id).await?,
                };
                Ok(render::bike_detail(&bike))
            }
            Command::Add { fields, complete } => self.add(fields, complete).await,
            Command::Edit {
                id,
                fields,
                complete,
                active,
            } => {
                let status = match (complete, active) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                self.edit(&id, fields, status).await
            }
            Command::Complete { id } => {
                let bike = self.resolve(&id).await?;
                self.repository.complete_by_id(bike.id()).await?;
                Ok(format!("Bike marked as complete: {}", render::bike_row(&bike.completed())))
            }
            Command::Activate { id } => {
                let bike = self.resolve(&id).await?;
                self.repository.activate_by_id(bike.id()).await?;
                Ok(format!("Bike marked as active: {}", render::bike_row(&bike.activated())))
            }
            Command::Delete { id } => {
                let bike = self.resolve(&id).await?;
                self.repository.delete(bike.id()).await;
                Ok("Bike deleted".to_string())
            }
            Command::ClearCompleted => {
                self.repository.clear_completed().await;
                Ok("Completed bikes cleared".to_string())
            }
            Command::DeleteAll => {
                self.repository.delete_all().await;
                Ok("All bikes deleted".to_string())
            }
            Command::Parts => Ok(render::part_table()),
        }
    }

    async fn list(&self, filter: BikesFilter) -> Result<String> {
        let bikes = self.load_bikes().await?;
        let saved = self.local.age_display();
        Ok(render::bike_list(filter, &filter.apply(bikes), saved.as_deref()))
    }

    async fn load_bikes(&self) -> Result<Vec<Bike>> {
        self.repository
            .list()
            .await
            .context("Error loading bikes")
    }

    async fn add(&self, fields: BikeFields, complete: bool) -> Result<String> {
        let bike = Bike::new(fields.bike_type, fields.address)
            .with_parts(fields.parts.unwrap_or_default())
            .with_complete(complete);

        if bike.is_empty() {
            bail!("Bikes cannot be empty");
        }

        let row = render::bike_row(&bike);
        self.repository.save(bike).await;
        Ok(format!("Bike saved: {}", row))
    }

    /// Save a replacement for an existing bike under the same id. Fields not
    /// given keep their current value.
    async fn edit(&self, id: &str, fields: BikeFields, complete: Option<bool>) -> Result<String> {
        let current = self.resolve(id).await?;

        let mut bike = Bike::with_id(
            current.id(),
            replace_field(fields.bike_type, current.bike_type()),
            replace_field(fields.address, current.address()),
        )
        .with_parts(fields.parts.unwrap_or(*current.parts()))
        .with_complete(complete.unwrap_or(current.is_complete()));
        if let Some(image) = current.image() {
            bike = bike.with_image(image.to_vec());
        }

        if bike.is_empty() {
            bail!("Bikes cannot be empty");
        }

        let row = render::bike_row(&bike);
        self.repository.save(bike).await;
        Ok(format!("Bike updated: {}", row))
    }

    /// Find a bike by full id or unique id prefix.
    ///
    /// Loads the list first so the repository cache can resolve the id.
    async fn resolve(&self, id: &str) -> Result<Bike> {
        let bikes = self.load_bikes().await?;
        let mut matches = bikes.into_iter().filter(|b| b.id().starts_with(id));
        let Some(bike) = matches.next() else {
            bail!("No bike found with id {}", id);
        };
        if bike.id() != id && matches.next().is_some() {
            bail!("Id prefix {} matches more than one bike", id);
        }
        Ok(bike)
    }
}

/// New value for an edited field: unset keeps the current one, blank clears it.
fn replace_field(new: Option<String>, current: Option<&str>) -> Option<String> {
    match new {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value),
        None => current.map(str::to_string),
    }
}
