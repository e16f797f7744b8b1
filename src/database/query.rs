use crate::database::DbBackend;
use crate::models::RetrieveSpec;

/// 生成好的参数化 SELECT
///
/// 列和表达式原样拼接，只有条件值通过参数绑定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<String>,
}

impl SelectQuery {
    pub fn build(spec: &RetrieveSpec, backend: DbBackend) -> Self {
        let predicates = spec.active_predicates();
        let conditions: Vec<String> = predicates
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let placeholder = backend.placeholder(idx + 1);
                match backend {
                    // 参数按文本绑定，PostgreSQL 不做隐式转换
                    DbBackend::Postgres => format!("CAST({} AS TEXT) = {}", p.column, placeholder),
                    _ => format!("{} = {}", p.column, placeholder),
                }
            })
            .collect();

        Self {
            sql: format!(
                "SELECT {} FROM {} WHERE {}",
                spec.select,
                spec.from,
                conditions.join(" AND ")
            ),
            params: predicates.iter().map(|p| p.value.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Predicate;

    fn spec(p2: (&str, &str), p3: (&str, &str)) -> RetrieveSpec {
        RetrieveSpec {
            select: "name".to_string(),
            from: "users".to_string(),
            predicates: [
                Predicate::new("id", "7"),
                Predicate::new(p2.0, p2.1),
                Predicate::new(p3.0, p3.1),
            ],
        }
    }

    #[test]
    fn test_single_predicate_mysql() {
        let q = SelectQuery::build(
            &spec(("WHERE column2", "Value 2"), ("WHERE column3", "Value 3")),
            DbBackend::MySql,
        );
        assert_eq!(q.sql, "SELECT name FROM users WHERE id = ?");
        assert_eq!(q.params, vec!["7"]);
    }

    #[test]
    fn test_third_predicate_needs_second() {
        let q = SelectQuery::build(&spec(("", ""), ("email", "a@b.c")), DbBackend::MySql);
        assert_eq!(q.sql, "SELECT name FROM users WHERE id = ?");
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn test_three_predicates_sql_server() {
        let q = SelectQuery::build(
            &spec(("role", "admin"), ("email", "a@b.c")),
            DbBackend::SqlServer,
        );
        assert_eq!(
            q.sql,
            "SELECT name FROM users WHERE id = @P1 AND role = @P2 AND email = @P3"
        );
        assert_eq!(q.params, vec!["7", "admin", "a@b.c"]);
    }

    #[test]
    fn test_postgres_numbered_placeholders() {
        let q = SelectQuery::build(
            &spec(("role", "admin"), ("WHERE column3", "Value 3")),
            DbBackend::Postgres,
        );
        assert_eq!(
            q.sql,
            "SELECT name FROM users WHERE CAST(id AS TEXT) = $1 AND CAST(role AS TEXT) = $2"
        );
    }
}
