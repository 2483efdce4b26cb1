use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, Login, ResultEngine, accounts, logins,
    util::{normalize_email, require_password},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a new, unverified login.
    ///
    /// Fails with `ExistingKey` when the email is already registered, verified
    /// or not.
    pub async fn register(&self, email: &str, password: &str) -> ResultEngine<Login> {
        let email = normalize_email(email)?;
        require_password(password)?;
        let password_hash = self.hasher.hash(password)?;

        with_tx!(self, |db_tx| {
            let exists = logins::Entity::find()
                .filter(logins::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let model = logins::ActiveModel {
                id: ActiveValue::NotSet,
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(password_hash),
                verified: ActiveValue::Set(false),
            }
            .insert(&db_tx)
            .await?;
            Ok(Login::from(model))
        })
    }

    /// Mark a login as verified. The id must exist.
    pub async fn verify_login(&self, login_id: i32) -> ResultEngine<Login> {
        with_tx!(self, |db_tx| {
            let model = self.require_login(&db_tx, login_id).await?;
            let mut active: logins::ActiveModel = model.into();
            active.verified = ActiveValue::Set(true);
            let model = active.update(&db_tx).await?;
            Ok(Login::from(model))
        })
    }

    /// Mark the login registered under `email` as verified, whatever its
    /// current state. Returns `None` when no login uses that email.
    pub async fn verify_login_by_email(&self, email: &str) -> ResultEngine<Option<Login>> {
        let model = logins::Entity::find()
            .filter(logins::Column::Email.eq(email.trim()))
            .one(&self.database)
            .await?;
        match model {
            Some(model) => self.verify_login(model.id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Mark login `login_id` as verified, provided it still exists under
    /// `email`. A login deleted since the link was issued, or its email
    /// reused by a newer registration, yields `None`.
    pub async fn verify_registration(
        &self,
        login_id: i32,
        email: &str,
    ) -> ResultEngine<Option<Login>> {
        with_tx!(self, |db_tx| {
            let model = logins::Entity::find_by_id(login_id)
                .filter(logins::Column::Email.eq(email.trim()))
                .one(&db_tx)
                .await?;
            let Some(model) = model else {
                return Ok(None);
            };
            let mut active: logins::ActiveModel = model.into();
            active.verified = ActiveValue::Set(true);
            let model = active.update(&db_tx).await?;
            Ok(Some(Login::from(model)))
        })
    }

    /// Existence-guaranteed lookup: a missing login is an internal fault.
    pub async fn login_by_id(&self, login_id: i32) -> ResultEngine<Login> {
        self.require_login(&self.database, login_id)
            .await
            .map(Login::from)
    }

    /// Existence-uncertain lookup. Unverified logins are not returned.
    pub async fn login_by_email(&self, email: &str) -> ResultEngine<Option<Login>> {
        let model = logins::Entity::find()
            .filter(logins::Column::Email.eq(email.trim()))
            .filter(logins::Column::Verified.eq(true))
            .one(&self.database)
            .await?;
        Ok(model.map(Login::from))
    }

    /// Returns the login when `email` belongs to a verified login and
    /// `password` matches. Every other case is `None`, without saying which
    /// part was wrong.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Option<Login>> {
        let Some(login) = self.login_by_email(email).await? else {
            return Ok(None);
        };
        if !self.hasher.verify(password, &login.password_hash) {
            return Ok(None);
        }
        Ok(Some(login))
    }

    /// Replace the password of `login_id` after checking the current one.
    pub async fn change_password(
        &self,
        login_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        require_password(new_password)?;
        let login = self.login_by_id(login_id).await?;
        if !self.hasher.verify(old_password, &login.password_hash) {
            return Err(EngineError::InvalidCredentials);
        }
        let password_hash = self.hasher.hash(new_password)?;

        logins::ActiveModel {
            id: ActiveValue::Unchanged(login.id),
            password_hash: ActiveValue::Set(password_hash),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        Ok(())
    }

    /// Delete a login together with its accounts, transactions and
    /// schedules, children first.
    pub async fn delete_login(&self, login_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_login(&db_tx, login_id).await?;

            let owned = accounts::Entity::find()
                .filter(accounts::Column::LoginId.eq(login_id))
                .all(&db_tx)
                .await?;
            for account in owned {
                self.delete_account_rows(&db_tx, account.id).await?;
            }

            logins::Entity::delete_by_id(login_id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
