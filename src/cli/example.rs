use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tablegraph::config::{
    Config, EnumConfig, RelationshipConfig, ServerConfig, TableConfig, ThroughConfig,
};
use tablegraph::error::Result;
use tablegraph::metadata::Cardinality;
use tablegraph::registration::RegisterOptions;
use tablegraph::store::Order;

const AUTHORS: &str = "\
id,name,country
1,Ursula K. Le Guin,US
2,Stanislaw Lem,PL
3,Mary Beard,GB
";

const BOOKS: &str = "\
id,title,author_id,genre,published,price
1,The Dispossessed,1,FICTION,1974-05-01,9.99
2,The Left Hand of Darkness,1,FICTION,1969-03-01,8.5
3,Solaris,2,FICTION,1961-01-01,7.25
4,SPQR,3,HISTORY,2015-10-20,14.0
5,Summa Technologiae,2,SCIENCE,1964-01-01,12.75
";

const TAGS: &str = "\
id,label
1,classic
2,space
3,rome
";

const BOOK_TAGS: &str = "\
book_id,tag_id
1,1
1,2
2,1
3,2
4,3
";

/// Write the example CSV tables into `data_dir`
pub fn write_example_data(data_dir: &str) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    for (name, contents) in [
        ("authors", AUTHORS),
        ("books", BOOKS),
        ("tags", TAGS),
        ("book_tags", BOOK_TAGS),
    ] {
        let path = Path::new(data_dir).join(format!("{}.csv", name));
        fs::write(&path, contents)?;
        tracing::info!("   Wrote {}", path.display());
    }
    Ok(())
}

fn table(data_dir: &str, name: &str) -> TableConfig {
    TableConfig {
        name: name.to_string(),
        path: format!("{}/{}.csv", data_dir, name),
        primary_key: vec!["id".to_string()],
        enums: IndexMap::new(),
        relationships: Vec::new(),
        expose: None,
    }
}

fn relationship(
    name: &str,
    target: &str,
    cardinality: Cardinality,
    local_key: &str,
    remote_key: &str,
) -> RelationshipConfig {
    RelationshipConfig {
        name: name.to_string(),
        target: target.to_string(),
        cardinality,
        local_key: local_key.to_string(),
        remote_key: remote_key.to_string(),
        through: None,
    }
}

fn through(table: &str, local_key: &str, remote_key: &str) -> Option<ThroughConfig> {
    Some(ThroughConfig {
        table: table.to_string(),
        local_key: local_key.to_string(),
        remote_key: remote_key.to_string(),
    })
}

/// Configuration for the example library tables
pub fn example_config(data_dir: &str) -> Config {
    let mut authors = table(data_dir, "authors");
    authors.relationships.push(relationship(
        "books",
        "books",
        Cardinality::Many,
        "id",
        "author_id",
    ));
    authors.expose = Some(RegisterOptions {
        graphql_name: Some("author".to_string()),
        description: Some("Book authors".to_string()),
        filter_fields: vec!["name".to_string(), "country".to_string()],
        order_fields: vec!["name".to_string()],
        default_order: [("name".to_string(), Order::Asc)].into_iter().collect(),
        relationships: vec!["books".to_string()],
        ..Default::default()
    });

    let mut books = table(data_dir, "books");
    books.enums.insert(
        "genre".to_string(),
        EnumConfig {
            name: "Genre".to_string(),
            variants: vec![
                "FICTION".to_string(),
                "HISTORY".to_string(),
                "SCIENCE".to_string(),
            ],
        },
    );
    books.relationships.push(relationship(
        "author",
        "authors",
        Cardinality::One,
        "author_id",
        "id",
    ));
    books.relationships.push(RelationshipConfig {
        through: through("book_tags", "book_id", "tag_id"),
        ..relationship("tags", "tags", Cardinality::Many, "id", "id")
    });
    books.expose = Some(RegisterOptions {
        graphql_name: Some("book".to_string()),
        exclude_fields: vec!["author_id".to_string()],
        filter_fields: vec![
            "title".to_string(),
            "genre".to_string(),
            "published".to_string(),
            "price".to_string(),
        ],
        order_fields: vec!["published".to_string(), "price".to_string()],
        pagination: true,
        default_limit: Some(10),
        max_limit: Some(100),
        relationships: vec!["author".to_string(), "tags".to_string()],
        ..Default::default()
    });

    let mut tags = table(data_dir, "tags");
    tags.relationships.push(RelationshipConfig {
        through: through("book_tags", "tag_id", "book_id"),
        ..relationship("books", "books", Cardinality::Many, "id", "id")
    });
    tags.expose = Some(RegisterOptions {
        graphql_name: Some("tag".to_string()),
        filter_fields: vec!["label".to_string()],
        relationships: vec!["books".to_string()],
        ..Default::default()
    });

    let mut book_tags = table(data_dir, "book_tags");
    book_tags.primary_key = vec!["book_id".to_string(), "tag_id".to_string()];

    Config {
        server: ServerConfig {
            max_query_depth: Some(4),
            ..Default::default()
        },
        register_all: false,
        tables: vec![authors, books, tags, book_tags],
    }
}
