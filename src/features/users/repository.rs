use crate::features::users::models::User;
use crate::shared::config::environment::app_timezone;
use crate::shared::database::documents;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{current_timestamp, ensure_id};
use rusqlite::Connection;

/// ユーザーを登録する
///
/// IDが空の場合は新しいIDを割り当てる
pub fn add_user(conn: &Connection, user: User) -> AppResult<User> {
    if !user.email.is_empty() && !user.email.contains('@') {
        return Err(AppError::validation("メールアドレスの形式が正しくありません"));
    }

    let now = current_timestamp(app_timezone());
    let user = User {
        id: ensure_id(&user.id),
        created_at: if user.created_at.is_empty() {
            now.clone()
        } else {
            user.created_at
        },
        updated_at: now,
        ..user
    };

    documents::upsert(conn, &user)?;
    log::info!("ユーザーを登録しました: id={}", user.id);

    Ok(user)
}

/// ユーザーを取得する
pub fn get_user(conn: &Connection, user_id: &str) -> AppResult<Option<User>> {
    documents::find_by_id(conn, user_id)
}

/// ユーザー情報を更新する（ドキュメント全体を置き換え）
pub fn update_user(conn: &Connection, user: User) -> AppResult<User> {
    if user.id.trim().is_empty() {
        return Err(AppError::validation("ユーザーIDが指定されていません"));
    }

    let user = User {
        updated_at: current_timestamp(app_timezone()),
        ..user
    };
    documents::upsert(conn, &user)?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::open_in_memory;

    fn new_user() -> User {
        User {
            id: String::new(),
            name: "Sari".to_string(),
            email: "sari@example.com".to_string(),
            business_name: "Warung Sari".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_add_and_get_user() {
        let conn = open_in_memory().unwrap();

        let user = add_user(&conn, new_user()).unwrap();
        assert!(!user.id.is_empty());
        assert!(!user.created_at.is_empty());

        let fetched = get_user(&conn, &user.id).unwrap();
        assert_eq!(fetched, Some(user));
        assert_eq!(get_user(&conn, "unknown").unwrap(), None);
    }

    #[test]
    fn test_update_user() {
        let conn = open_in_memory().unwrap();
        let user = add_user(&conn, new_user()).unwrap();

        let updated = update_user(
            &conn,
            User {
                business_name: "Warung Sari 2".to_string(),
                ..user.clone()
            },
        )
        .unwrap();

        assert_eq!(updated.business_name, "Warung Sari 2");
        assert_eq!(updated.created_at, user.created_at);
        assert_eq!(
            get_user(&conn, &user.id).unwrap().unwrap().business_name,
            "Warung Sari 2"
        );
    }

    #[test]
    fn test_validation() {
        let conn = open_in_memory().unwrap();

        let invalid_email = User {
            email: "not-an-email".to_string(),
            ..new_user()
        };
        assert!(matches!(
            add_user(&conn, invalid_email),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update_user(&conn, new_user()),
            Err(AppError::Validation(_))
        ));
    }
}
