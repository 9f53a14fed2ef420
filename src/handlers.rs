use std::sync::Arc;

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};

use crate::error::ApiError;
use crate::model::VehiclePayload;
use crate::repository::VehicleRepository;
use crate::vin::{normalize_and_validate, Vin};

pub struct AppState {
    pub vehicles: Arc<dyn VehicleRepository>,
}

impl AppState {
    pub fn new(vehicles: Arc<dyn VehicleRepository>) -> Self {
        Self { vehicles }
    }
}

/// Registers the vehicle routes under `/vehicles` and the older `/vehicle` prefix.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(index)
        .service(vehicle_scope("/vehicles"))
        .service(vehicle_scope("/vehicle"));
}

fn vehicle_scope(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .service(get_vehicles)
        .service(post_vehicle)
        .service(get_vehicle_by_vin)
        .service(put_vehicle_by_vin)
        .service(delete_vehicle_by_vin)
}

/// Bodies that fail to parse are reported in the same envelope as field errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        ApiError::MalformedBody(err.to_string()).into()
    })
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Hello, World!" }))
}

#[get("")]
async fn get_vehicles(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let vehicles = data.vehicles.list_all().await?;
    Ok(HttpResponse::Ok().json(vehicles))
}

#[post("")]
async fn post_vehicle(
    data: web::Data<AppState>,
    request: web::Json<VehiclePayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = request.into_inner();
    let vin = normalize_and_validate(payload.vin.as_deref())?;
    let input = payload
        .into_input(vin)
        .map_err(ApiError::FieldConstraints)?;

    // fast path only; the repository insert is what actually enforces uniqueness
    if data.vehicles.exists(&input.vin).await? {
        return Err(ApiError::DuplicateVin);
    }

    let vehicle = data.vehicles.create(input).await?;
    log::info!("Created vehicle {} with id {}", vehicle.vin, vehicle.id);
    Ok(HttpResponse::Created().json(vehicle))
}

#[get("/{vin}")]
async fn get_vehicle_by_vin(
    data: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let vin = Vin::parse(&path.into_inner().0)?;
    let vehicle = data.vehicles.find_by_vin(&vin).await?;
    Ok(HttpResponse::Ok().json(vehicle))
}

/// The body is extracted lazily so path and lookup failures are reported
/// before anything about the body.
#[put("/{vin}")]
async fn put_vehicle_by_vin(
    data: web::Data<AppState>,
    path: web::Path<(String,)>,
    request: Result<web::Json<VehiclePayload>, actix_web::Error>,
) -> Result<HttpResponse, actix_web::Error> {
    let vin = Vin::parse(&path.into_inner().0).map_err(ApiError::from)?;
    data.vehicles
        .find_by_vin(&vin)
        .await
        .map_err(ApiError::from)?;

    // already shaped as MalformedBody by `json_config`
    let payload = request?.into_inner();
    let body_vin = normalize_and_validate(payload.vin.as_deref()).map_err(ApiError::from)?;
    if body_vin != vin {
        return Err(ApiError::VinMismatch.into());
    }
    let input = payload
        .into_input(body_vin)
        .map_err(ApiError::FieldConstraints)?;

    let vehicle = data
        .vehicles
        .update(&vin, input)
        .await
        .map_err(ApiError::from)?;
    log::info!("Updated vehicle {}", vehicle.vin);
    Ok(HttpResponse::Ok().json(vehicle))
}

#[delete("/{vin}")]
async fn delete_vehicle_by_vin(
    data: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let vin = Vin::parse(&path.into_inner().0)?;
    data.vehicles.find_by_vin(&vin).await?;
    data.vehicles.delete(&vin).await?;
    log::info!("Deleted vehicle {}", vin);
    Ok(HttpResponse::NoContent().finish())
}
