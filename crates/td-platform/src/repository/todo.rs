//! Todo Repository
//!
//! Todo persistence: filtered listings, wildcard and text search, partial
//! updates, and counts. All listings order by deadline ascending, the
//! operationally useful order for a todo list.

use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
    Collection, Database,
};
use futures::TryStreamExt;

use crate::domain::{NewTodo, Priority, Todo, TodoPatch};
use crate::error::Result;
use crate::tsid::TsidGenerator;

pub struct TodoRepository {
    collection: Collection<Todo>,
}

impl TodoRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("todos"),
        }
    }

    /// Validate and persist a new todo. The deadline is judged against the
    /// wall-clock UTC date at the moment of the call.
    pub async fn create(&self, new_todo: NewTodo) -> Result<Todo> {
        let todo = new_todo.into_todo(chrono::Utc::now().date_naive())?;
        self.collection.insert_one(&todo).await?;
        Ok(todo)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Todo>> {
        if !TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// List todos; filters are ANDed, order is deadline ascending.
    pub async fn list(
        &self,
        skip: u64,
        limit: i64,
        completed: Option<bool>,
        priority: Option<Priority>,
    ) -> Result<Vec<Todo>> {
        let mut filter = doc! {};
        if let Some(completed) = completed {
            filter.insert("completed", completed);
        }
        if let Some(priority) = priority {
            filter.insert("priority", priority.as_str());
        }
        self.find_page(filter, skip, limit).await
    }

    /// Same as `list` with an additional equality filter on the owner.
    pub async fn list_by_username(
        &self,
        username: &str,
        skip: u64,
        limit: i64,
        completed: Option<bool>,
    ) -> Result<Vec<Todo>> {
        let mut filter = doc! { "username": username };
        if let Some(completed) = completed {
            filter.insert("completed", completed);
        }
        self.find_page(filter, skip, limit).await
    }

    /// Apply a partial update, re-validating changed fields. Returns `None`
    /// when the id does not exist; an empty patch returns the current state.
    pub async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>> {
        let Some(mut todo) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(todo));
        }

        patch.apply(&mut todo, chrono::Utc::now().date_naive())?;
        self.collection
            .replace_one(doc! { "_id": &todo.id }, &todo)
            .await?;
        Ok(Some(todo))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        if !TsidGenerator::is_valid(id) {
            return Ok(false);
        }
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Search titles and descriptions. A query containing `*` runs in
    /// wildcard mode: `*` matches any run of characters, everything else
    /// matches literally, case-insensitively, anywhere in the field. Any
    /// other query uses the store's text index.
    pub async fn search(&self, query: &str, skip: u64, limit: i64) -> Result<Vec<Todo>> {
        let filter = if query.contains('*') {
            let pattern = wildcard_regex(query);
            doc! {
                "$or": [
                    { "title": { "$regex": &pattern, "$options": "i" } },
                    { "description": { "$regex": &pattern, "$options": "i" } },
                ]
            }
        } else {
            doc! { "$text": { "$search": query } }
        };
        self.find_page(filter, skip, limit).await
    }

    pub async fn count(&self, completed: Option<bool>) -> Result<u64> {
        let mut filter = doc! {};
        if let Some(completed) = completed {
            filter.insert("completed", completed);
        }
        Ok(self.collection.count_documents(filter).await?)
    }

    async fn find_page(
        &self,
        filter: Document,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Todo>> {
        let options = FindOptions::builder()
            .sort(doc! { "deadline": 1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }
}

/// Turn a wildcard query into a regex pattern: escape every regex
/// metacharacter, then let `*` (and only `*`) match any run of characters.
fn wildcard_regex(query: &str) -> String {
    regex::escape(query).replace("\\*", ".*")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .unwrap()
            .is_match(text)
    }

    #[test]
    fn test_wildcard_matches_prefix() {
        let pattern = wildcard_regex("proj*");
        assert!(matches(&pattern, "Project Plan"));
        assert!(matches(&pattern, "project"));
        assert!(!matches(&pattern, "object"));
    }

    #[test]
    fn test_wildcard_is_unanchored() {
        let pattern = wildcard_regex("*plan*");
        assert!(matches(&pattern, "Project Plan Review"));
        assert!(matches(&pattern, "plan"));
    }

    #[test]
    fn test_wildcard_is_case_insensitive() {
        let pattern = wildcard_regex("PROJ*");
        assert!(matches(&pattern, "project"));
    }

    #[test]
    fn test_metacharacters_match_literally() {
        let pattern = wildcard_regex("a.b*");
        assert!(matches(&pattern, "a.b stuff"));
        assert!(!matches(&pattern, "axb stuff"));

        let pattern = wildcard_regex("(v1)*");
        assert!(matches(&pattern, "release (v1) notes"));
        assert!(!matches(&pattern, "release v1 notes"));
    }
}
