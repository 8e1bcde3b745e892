//! Integration test: object mappers behind a custom resolver
//!
//! Tests nested mapping, the recursion guard and configuration loading with
//! a minimal resolver instead of the registry.

use objmap_mapping::{
    ErasedMapper, ErrorKind, Facade, MapperConfig, MapperResolver, ObjectMapper,
};
use objmap_reflect::{TypePair, record};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct StaticResolver {
    mappers: HashMap<TypePair, Arc<dyn ErasedMapper>>,
}

impl StaticResolver {
    fn with(mut self, mapper: Arc<dyn ErasedMapper>) -> Self {
        self.mappers.insert(mapper.pair(), mapper);
        self
    }
}

impl MapperResolver for StaticResolver {
    fn resolve(&self, pair: &TypePair) -> Option<Arc<dyn ErasedMapper>> {
        self.mappers.get(pair).cloned()
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Line {
        pub sku: String,
        pub quantity: u16,
        pub price: f64,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct LineDto {
        pub sku: String,
        pub quantity: i32,
        pub total: f64,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Order {
        pub id: u64,
        pub lines: Vec<Line>,
        pub by_sku: BTreeMap<String, Line>,
        pub attributes: serde_json::Value,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct OrderDto {
        pub id: String,
        pub lines: Vec<LineDto>,
        pub by_sku: BTreeMap<String, LineDto>,
        pub attributes: Vec<String>,
        pub line_count: usize,
    }
}

fn order() -> Order {
    let line = Line {
        sku: "A-1".to_string(),
        quantity: 3,
        price: 2.5,
    };
    Order {
        id: 7,
        lines: vec![line.clone()],
        by_sku: BTreeMap::from([("A-1".to_string(), line)]),
        attributes: serde_json::Value::Null,
    }
}

fn line_mapper() -> anyhow::Result<ObjectMapper<Line, LineDto>> {
    let mut mapper = ObjectMapper::new();
    mapper.map_property("total", |line: &Line, _| {
        Ok(f64::from(line.quantity) * line.price)
    })?;
    Ok(mapper)
}

#[test]
fn test_nested_sequences_and_dictionaries() -> anyhow::Result<()> {
    init_tracing();
    let resolver = StaticResolver::default().with(Arc::new(line_mapper()?));
    let config = MapperConfig::default();
    let facade = Facade::new(&resolver, &config);

    let mut mapper = ObjectMapper::<Order, OrderDto>::new();
    mapper
        .ignore("attributes")?
        .after_map(|order: &Order, dto: &mut OrderDto, _| {
            dto.line_count = order.lines.len();
            Ok(())
        })?;

    let dto = mapper.map(&order(), &facade)?;

    assert_eq!(dto.id, "7");
    assert_eq!(dto.line_count, 1);
    assert_eq!(dto.lines[0].quantity, 3);
    assert!((dto.lines[0].total - 7.5).abs() < f64::EPSILON);
    assert_eq!(dto.by_sku["A-1"], dto.lines[0]);
    assert!(dto.attributes.is_empty());
    Ok(())
}

#[test]
fn test_opaque_member_without_mapping_is_unsupported() -> anyhow::Result<()> {
    init_tracing();
    let resolver = StaticResolver::default().with(Arc::new(line_mapper()?));
    let config = MapperConfig::default();
    let facade = Facade::new(&resolver, &config);
    let mapper = ObjectMapper::<Order, OrderDto>::new();

    let err = mapper.map(&order(), &facade).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingMapper);
    assert_eq!(err.property_path().as_deref(), Some("attributes"));
    Ok(())
}

#[test]
fn test_nested_mapper_sees_child_facade() -> anyhow::Result<()> {
    init_tracing();
    let mut line_mapper = ObjectMapper::<Line, LineDto>::new();
    line_mapper.map_property("quantity", |_: &Line, facade: &Facade<'_>| {
        Ok(i32::try_from(facade.depth()).unwrap_or(i32::MAX))
    })?;
    let resolver = StaticResolver::default().with(Arc::new(line_mapper));
    let config = MapperConfig::default();
    let facade = Facade::new(&resolver, &config);

    let mut mapper = ObjectMapper::<Order, OrderDto>::new();
    mapper.ignore("attributes")?;
    let dto = mapper.map(&order(), &facade)?;

    assert_eq!(facade.depth(), 0);
    assert_eq!(dto.lines[0].quantity, 2);
    Ok(())
}

#[test]
fn test_depth_limit_from_yaml_config() -> anyhow::Result<()> {
    init_tracing();
    let resolver = StaticResolver::default().with(Arc::new(line_mapper()?));
    let config = MapperConfig::from_yaml_str("max_depth: 1\ndetect_cycles: true\n")?;
    let facade = Facade::new(&resolver, &config);

    let mut mapper = ObjectMapper::<Order, OrderDto>::new();
    mapper.ignore("attributes")?;
    let err = mapper.map(&order(), &facade).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RecursionLimit);
    assert_eq!(err.property_path().as_deref(), Some("lines"));
    Ok(())
}
