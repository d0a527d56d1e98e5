//! Comment operations, always scoped to a parent car.

use crate::error::{AppError, Result};
use crate::forms::CommentFields;
use crate::models::{Car, CarId, Comment, CommentId, Requester};
use crate::policy::{is_owner_or_read_only, Access};
use crate::traits::CarRepo;

use super::{require_user, retrieve_car};

/// Comments of one car, newest first. An unknown car simply has none.
pub async fn list_comments(cars: &dyn CarRepo, car_id: CarId) -> Result<Vec<Comment>> {
    Ok(cars.list_comments(car_id).await?)
}

/// Authenticated creation; the parent car must exist.
pub async fn create_comment(
    cars: &dyn CarRepo,
    requester: &Requester,
    car_id: CarId,
    fields: &CommentFields,
) -> Result<Comment> {
    let author_id = require_user(requester)?;
    let car = retrieve_car(cars, car_id).await?;
    let content = fields.validate()?;
    Ok(cars.insert_comment(car.id, author_id, &content).await?)
}

/// Form post on the car detail page. Anonymous or blank submissions are
/// dropped without error; the caller redirects back either way. A created
/// comment is returned together with its car.
pub async fn comment_from_detail_page(
    cars: &dyn CarRepo,
    requester: &Requester,
    car_id: CarId,
    fields: &CommentFields,
) -> Result<Option<(Car, Comment)>> {
    let car = retrieve_car(cars, car_id).await?;
    let Some(author_id) = requester.user_id() else {
        return Ok(None);
    };
    let Ok(content) = fields.validate() else {
        return Ok(None);
    };
    let comment = cars.insert_comment(car.id, author_id, &content).await?;
    Ok(Some((car, comment)))
}

pub async fn retrieve_comment(cars: &dyn CarRepo, car_id: CarId, id: CommentId) -> Result<Comment> {
    cars.get_comment(car_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment", id))
}

async fn comment_for_write(
    cars: &dyn CarRepo,
    requester: &Requester,
    car_id: CarId,
    id: CommentId,
    access: Access,
) -> Result<Comment> {
    if access == Access::Unsafe {
        require_user(requester)?;
    }
    let comment = retrieve_comment(cars, car_id, id).await?;
    if !is_owner_or_read_only(requester, &comment, access) {
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action.".into(),
        ));
    }
    Ok(comment)
}

/// Author-only content update. With `partial`, an absent `content` keeps the old text.
pub async fn modify_comment(
    cars: &dyn CarRepo,
    requester: &Requester,
    car_id: CarId,
    id: CommentId,
    access: Access,
    fields: &CommentFields,
    partial: bool,
) -> Result<Comment> {
    let comment = comment_for_write(cars, requester, car_id, id, access).await?;
    if partial && fields.content.is_none() {
        return Ok(comment);
    }
    let content = fields.validate()?;
    cars.update_comment(comment.id, &content)
        .await?
        .ok_or_else(|| AppError::not_found("Comment", id))
}

/// Author-only delete.
pub async fn destroy_comment(
    cars: &dyn CarRepo,
    requester: &Requester,
    car_id: CarId,
    id: CommentId,
    access: Access,
) -> Result<()> {
    let comment = comment_for_write(cars, requester, car_id, id, access).await?;
    cars.delete_comment(comment.id).await?;
    Ok(())
}
