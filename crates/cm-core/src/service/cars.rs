//! Car operations.
//!
//! Two write paths exist. The page handlers look the car up inside the
//! requester's own records, so a stranger's car is `NotFound`. The API looks
//! the car up globally and then applies the ownership policy, so a stranger's
//! car is `Forbidden`.

use crate::error::{AppError, Result};
use crate::forms::CarFields;
use crate::models::{Car, CarId, Comment, Requester};
use crate::policy::{is_owner_or_read_only, Access};
use crate::traits::CarRepo;

use super::require_user;

pub async fn list_cars(cars: &dyn CarRepo) -> Result<Vec<Car>> {
    Ok(cars.list_cars().await?)
}

pub async fn retrieve_car(cars: &dyn CarRepo, id: CarId) -> Result<Car> {
    cars.get_car(id)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))
}

/// A car with its comments, newest first.
pub async fn car_with_comments(cars: &dyn CarRepo, id: CarId) -> Result<(Car, Vec<Comment>)> {
    let car = retrieve_car(cars, id).await?;
    let comments = cars.list_comments(id).await?;
    Ok((car, comments))
}

/// Creates a car owned by the requester. Any submitted owner is ignored.
pub async fn create_car(cars: &dyn CarRepo, requester: &Requester, fields: &CarFields) -> Result<Car> {
    let owner_id = require_user(requester)?;
    let input = fields.validate()?;
    Ok(cars.insert_car(owner_id, &input).await?)
}

/// Lookup restricted to the requester's own cars.
pub async fn owned_car(cars: &dyn CarRepo, requester: &Requester, id: CarId) -> Result<Car> {
    let owner_id = require_user(requester)?;
    cars.get_car_owned_by(id, owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))
}

/// Page edit: owner-scoped lookup, then a full update.
pub async fn update_owned_car(
    cars: &dyn CarRepo,
    requester: &Requester,
    id: CarId,
    fields: &CarFields,
) -> Result<Car> {
    let car = owned_car(cars, requester, id).await?;
    let input = fields.validate()?;
    cars.update_car(car.id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))
}

/// Page delete: owner-scoped lookup, then delete (comments cascade).
pub async fn delete_owned_car(cars: &dyn CarRepo, requester: &Requester, id: CarId) -> Result<()> {
    let car = owned_car(cars, requester, id).await?;
    if cars.delete_car(car.id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Car", id))
    }
}

/// API lookup for writes: global id, then object permission for `access`.
async fn car_for_write(cars: &dyn CarRepo, requester: &Requester, id: CarId, access: Access) -> Result<Car> {
    if access == Access::Unsafe {
        require_user(requester)?;
    }
    let car = retrieve_car(cars, id).await?;
    if !is_owner_or_read_only(requester, &car, access) {
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action.".into(),
        ));
    }
    Ok(car)
}

/// API update. `access` is classified from the request method; `partial` selects PATCH semantics.
pub async fn modify_car(
    cars: &dyn CarRepo,
    requester: &Requester,
    id: CarId,
    access: Access,
    fields: &CarFields,
    partial: bool,
) -> Result<Car> {
    let car = car_for_write(cars, requester, id, access).await?;
    let input = if partial {
        fields.validate_partial(&car)?
    } else {
        fields.validate()?
    };
    cars.update_car(car.id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))
}

/// API delete.
pub async fn destroy_car(cars: &dyn CarRepo, requester: &Requester, id: CarId, access: Access) -> Result<()> {
    let car = car_for_write(cars, requester, id, access).await?;
    cars.delete_car(car.id).await?;
    Ok(())
}
