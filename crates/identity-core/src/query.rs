//! Conjunctive queries over identity records.
//!
//! A [`Query`] is a list of predicates that must all hold. Tenant scoping is
//! one more predicate appended to the list, so it narrows whatever the base
//! lookup asked for and never stands in for it.

use crate::domain::{RoleRecord, TenantKey, UserRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate<T> {
    NormalizedUserName(String),
    NormalizedEmail(String),
    NormalizedRoleName(String),
    Tenant(T),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T> {
    predicates: Vec<Predicate<T>>,
}

impl<T: TenantKey> Query<T> {
    pub fn user_name(normalized_user_name: impl Into<String>) -> Self {
        Self { predicates: vec![Predicate::NormalizedUserName(normalized_user_name.into())] }
    }

    pub fn email(normalized_email: impl Into<String>) -> Self {
        Self { predicates: vec![Predicate::NormalizedEmail(normalized_email.into())] }
    }

    pub fn role_name(normalized_name: impl Into<String>) -> Self {
        Self { predicates: vec![Predicate::NormalizedRoleName(normalized_name.into())] }
    }

    pub fn and(mut self, predicate: Predicate<T>) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn scoped_to(self, tenant: T) -> Self {
        self.and(Predicate::Tenant(tenant))
    }

    pub fn predicates(&self) -> &[Predicate<T>] {
        &self.predicates
    }

    /// The tenant this query is restricted to, if any.
    pub fn tenant(&self) -> Option<&T> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Tenant(t) => Some(t),
            _ => None,
        })
    }

    pub fn matches_user<U>(&self, user: &U) -> bool
    where
        U: UserRecord<Tenant = T>,
    {
        self.predicates.iter().all(|p| match p {
            Predicate::NormalizedUserName(n) => user.normalized_user_name() == Some(n.as_str()),
            Predicate::NormalizedEmail(e) => user.normalized_email() == Some(e.as_str()),
            Predicate::NormalizedRoleName(_) => false,
            Predicate::Tenant(t) => user.belongs_to(t),
        })
    }

    pub fn matches_role<R>(&self, role: &R) -> bool
    where
        R: RoleRecord<Tenant = T>,
    {
        self.predicates.iter().all(|p| match p {
            Predicate::NormalizedRoleName(n) => role.normalized_name() == Some(n.as_str()),
            Predicate::NormalizedUserName(_) | Predicate::NormalizedEmail(_) => false,
            Predicate::Tenant(t) => role.belongs_to(t),
        })
    }
}
