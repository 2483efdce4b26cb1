//! The module contains `Login` and the `logins` table.

use sea_orm::entity::prelude::*;

/// A login: the credentials a person uses to reach their accounts.
///
/// A login is created unverified and cannot authenticate until its email has
/// been confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Login {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "logins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Login {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            verified: model.verified,
        }
    }
}
