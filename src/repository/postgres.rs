use async_trait::async_trait;
use sqlx::postgres::PgPool;

use super::VehicleRepository;
use crate::error::RepositoryError;
use crate::model::{Vehicle, VehicleInput, MAX_MODEL_YEAR, MIN_MODEL_YEAR};
use crate::vin::Vin;

const UNIQUE_VIOLATION: &str = "23505";

fn create_table_sql() -> String {
    format!(
        r#"
    CREATE TABLE IF NOT EXISTS public.vehicles (
        id BIGSERIAL PRIMARY KEY,
        vin VARCHAR(17) NOT NULL,
        manufacturer_name TEXT NOT NULL,
        description TEXT,
        horse_power INTEGER NOT NULL CHECK (horse_power >= 0),
        model_name TEXT NOT NULL,
        model_year INTEGER NOT NULL CHECK (model_year BETWEEN {MIN_MODEL_YEAR} AND {MAX_MODEL_YEAR}),
        purchase_price DOUBLE PRECISION NOT NULL CHECK (purchase_price >= 0),
        fuel_type TEXT NOT NULL
    );
"#
    )
}

const CREATE_VIN_INDEX: &str =
    r#"CREATE UNIQUE INDEX IF NOT EXISTS vehicles_vin_key ON public.vehicles (vin);"#;

const COLUMNS: &str = "id, vin, manufacturer_name, description, horse_power, model_name, \
                       model_year, purchase_price, fuel_type";

/// Vehicle records in the `vehicles` table. VIN uniqueness is enforced by a
/// unique index, so concurrent inserts cannot both succeed.
#[derive(Clone)]
pub struct PgVehicleRepository {
    db: PgPool,
}

impl PgVehicleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates the table and the unique VIN index when they are missing.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        let create_table = create_table_sql();
        sqlx::query(&create_table)
            .execute(&self.db)
            .await
            .map_err(RepositoryError::Storage)?;
        sqlx::query(CREATE_VIN_INDEX)
            .execute(&self.db)
            .await
            .map_err(RepositoryError::Storage)?;
        Ok(())
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn list_all(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM public.vehicles ORDER BY id");
        let vehicles = sqlx::query_as::<_, Vehicle>(&sql)
            .fetch_all(&self.db)
            .await
            .map_err(RepositoryError::Storage)?;
        Ok(vehicles)
    }

    async fn find_by_vin(&self, vin: &Vin) -> Result<Vehicle, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM public.vehicles WHERE vin = $1");
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(vin.as_str())
            .fetch_optional(&self.db)
            .await
            .map_err(RepositoryError::Storage)?;
        vehicle.ok_or_else(|| RepositoryError::NotFound(vin.to_string()))
    }

    async fn exists(&self, vin: &Vin) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM public.vehicles WHERE vin = $1)")
                .bind(vin.as_str())
                .fetch_one(&self.db)
                .await
                .map_err(RepositoryError::Storage)?;
        Ok(exists)
    }

    async fn create(&self, input: VehicleInput) -> Result<Vehicle, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO public.vehicles
            (vin, manufacturer_name, description, horse_power, model_name, model_year, purchase_price, fuel_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        );
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(input.vin.as_str())
            .bind(&input.manufacturer_name)
            .bind(&input.description)
            .bind(input.horse_power)
            .bind(&input.model_name)
            .bind(input.model_year)
            .bind(input.purchase_price)
            .bind(&input.fuel_type)
            .fetch_one(&self.db)
            .await
            .map_err(map_insert_error)?;
        Ok(vehicle)
    }

    async fn update(&self, vin: &Vin, input: VehicleInput) -> Result<Vehicle, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE public.vehicles
            SET manufacturer_name = $2, description = $3, horse_power = $4, model_name = $5,
                model_year = $6, purchase_price = $7, fuel_type = $8
            WHERE vin = $1
            RETURNING {COLUMNS}
            "#
        );
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(vin.as_str())
            .bind(&input.manufacturer_name)
            .bind(&input.description)
            .bind(input.horse_power)
            .bind(&input.model_name)
            .bind(input.model_year)
            .bind(input.purchase_price)
            .bind(&input.fuel_type)
            .fetch_optional(&self.db)
            .await
            .map_err(RepositoryError::Storage)?;
        vehicle.ok_or_else(|| RepositoryError::NotFound(vin.to_string()))
    }

    async fn delete(&self, vin: &Vin) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM public.vehicles WHERE vin = $1")
            .bind(vin.as_str())
            .execute(&self.db)
            .await
            .map_err(RepositoryError::Storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(vin.to_string()));
        }
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return RepositoryError::DuplicateVin;
        }
    }
    RepositoryError::Storage(err)
}
