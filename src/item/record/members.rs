use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    core::{
        column::Column,
        dialect::Dialect,
        value::{FieldValue, Value},
    },
    error::{BindingError, ValueError},
};

pub(crate) type Getter<T> = Arc<dyn Fn(&T) -> Option<Value> + Send + Sync>;
pub(crate) type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync>;

pub(crate) fn getter<T, E, G>(get: G) -> Getter<T>
where
    G: Fn(&T) -> E + Send + Sync + 'static,
    E: FieldValue,
{
    Arc::new(move |record| get(record).into_value())
}

pub(crate) fn setter<T, E, S>(set: S) -> Setter<T>
where
    S: Fn(&mut T, E) + Send + Sync + 'static,
    E: FieldValue,
{
    Arc::new(move |record, value| {
        set(record, E::from_value(value)?);
        Ok(())
    })
}

/// The getter and setter bound to one record member.
pub struct Accessor<T> {
    pub(crate) getter: Option<Getter<T>>,
    pub(crate) setter: Option<Setter<T>>,
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self {
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<T> Default for Accessor<T> {
    fn default() -> Self {
        Self {
            getter: None,
            setter: None,
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

impl<T> Accessor<T> {
    pub(crate) fn is_empty(&self) -> bool {
        self.getter.is_none() && self.setter.is_none()
    }
}

/// Values handed to a record constructor, by column name.
pub struct ConstructorArgs<'r> {
    names: &'r [String],
    values: Vec<Option<Value>>,
}

impl<'r> ConstructorArgs<'r> {
    pub(crate) fn new(names: &'r [String], values: Vec<Option<Value>>) -> Self {
        Self { names, values }
    }

    /// The value of parameter `name` converted to `E`.
    ///
    /// # Errors
    ///
    /// [`BindingError::ConstructionFailure`] when `name` is not a parameter,
    /// the value has another type, or the value is absent and `E` has no
    /// representation of absence (absence maps to `None` for `Option<_>`).
    pub fn get<E: FieldValue>(&self, name: &str) -> Result<E, BindingError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| BindingError::ConstructionFailure(format!("{} is not a parameter", name)))?;

        match &self.values[index] {
            Some(value) => E::from_value(value.clone()).map_err(|err| {
                BindingError::ConstructionFailure(format!("parameter {}: {}", name, err))
            }),
            None => E::from_absent().ok_or_else(|| {
                BindingError::ConstructionFailure(format!("parameter {} has no value", name))
            }),
        }
    }
}

pub(crate) type Construct<T> =
    Arc<dyn Fn(&ConstructorArgs) -> Result<T, BindingError> + Send + Sync>;

pub(crate) enum Initializer<T> {
    /// Builds an empty record that setters then fill.
    Default(Arc<dyn Fn() -> T + Send + Sync>),
    /// Builds the record from the values of the named columns.
    Constructor {
        params: Vec<String>,
        construct: Construct<T>,
    },
}

impl<T> Clone for Initializer<T> {
    fn clone(&self) -> Self {
        match self {
            Initializer::Default(init) => Initializer::Default(Arc::clone(init)),
            Initializer::Constructor { params, construct } => Initializer::Constructor {
                params: params.clone(),
                construct: Arc::clone(construct),
            },
        }
    }
}

/// A type that can be read from and written to CSV rows.
///
/// `describe` registers the members of the type once; the binder then looks
/// up, for every schema column, how to set and get its value.
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::{column::Column, value::ValueType};
/// use fluent_csv_rs::item::record::{Members, Record};
///
/// #[derive(Debug, Default)]
/// struct Person {
///     id: i32,
///     name: String,
///     active: bool,
/// }
///
/// impl Person {
///     fn is_active(&self) -> bool {
///         self.active
///     }
/// }
///
/// impl Record for Person {
///     fn describe(members: &mut Members<Self>) {
///         members
///             .initializer(Person::default)
///             .column(Column::new("id", ValueType::Int), |p| p.id, |p, v| p.id = v)
///             .field("name", |p| p.name.clone(), |p, v| p.name = v)
///             .method_get("is_active", Person::is_active)
///             .method_set("set_active", |p: &mut Person, v: bool| p.active = v);
///     }
/// }
/// ```
pub trait Record: Sized + 'static {
    fn describe(members: &mut Members<Self>);

    /// The dialect used when a reader or writer of this type is given none.
    fn dialect() -> Option<Dialect> {
        None
    }
}

/// Registration table of a [`Record`] type's members.
pub struct Members<T> {
    pub(crate) columns: Vec<(Column, Accessor<T>)>,
    pub(crate) getters: HashMap<String, Getter<T>>,
    pub(crate) setters: HashMap<String, Setter<T>>,
    pub(crate) fields: HashMap<String, Accessor<T>>,
    pub(crate) initializer: Option<Initializer<T>>,
}

impl<T> Default for Members<T> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            getters: HashMap::new(),
            setters: HashMap::new(),
            fields: HashMap::new(),
            initializer: None,
        }
    }
}

impl<T: Record> Members<T> {
    pub(crate) fn describe() -> Self {
        let mut members = Members::default();
        T::describe(&mut members);
        members
    }
}

impl<T> Members<T> {
    /// Declares a column bound to a member, read and written.
    pub fn column<E, G, S>(&mut self, column: Column, get: G, set: S) -> &mut Self
    where
        E: FieldValue,
        G: Fn(&T) -> E + Send + Sync + 'static,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        let accessor = Accessor {
            getter: Some(getter(get)),
            setter: Some(setter(set)),
        };
        self.columns.push((column, accessor));
        self
    }

    /// Declares a column that is only written, from a computed value.
    pub fn column_getter<E, G>(&mut self, column: Column, get: G) -> &mut Self
    where
        E: FieldValue,
        G: Fn(&T) -> E + Send + Sync + 'static,
    {
        let accessor = Accessor {
            getter: Some(getter(get)),
            setter: None,
        };
        self.columns.push((column, accessor));
        self
    }

    /// Declares a column that is only read.
    pub fn column_setter<E, S>(&mut self, column: Column, set: S) -> &mut Self
    where
        E: FieldValue,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        let accessor = Accessor {
            getter: None,
            setter: Some(setter(set)),
        };
        self.columns.push((column, accessor));
        self
    }

    /// Registers a getter method, named `get_<column>` or `is_<column>`.
    pub fn method_get<E, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        E: FieldValue,
        G: Fn(&T) -> E + Send + Sync + 'static,
    {
        self.getters.insert(name.to_string(), getter(get));
        self
    }

    /// Registers a setter method, named `set_<column>`.
    pub fn method_set<E, S>(&mut self, name: &str, set: S) -> &mut Self
    where
        E: FieldValue,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        self.setters.insert(name.to_string(), setter(set));
        self
    }

    /// Registers a plain field, matched by column name.
    pub fn field<E, G, S>(&mut self, name: &str, get: G, set: S) -> &mut Self
    where
        E: FieldValue,
        G: Fn(&T) -> E + Send + Sync + 'static,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        let accessor = Accessor {
            getter: Some(getter(get)),
            setter: Some(setter(set)),
        };
        self.fields.insert(name.to_string(), accessor);
        self
    }

    /// Sets a zero-argument initializer; setters then fill the record.
    pub fn initializer<F>(&mut self, init: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.initializer = Some(Initializer::Default(Arc::new(init)));
        self
    }

    /// Sets a constructor taking the values of the `params` columns.
    ///
    /// Columns consumed by the constructor are not set again afterwards.
    ///
    /// ```
    /// use fluent_csv_rs::core::{column::Column, value::ValueType};
    /// use fluent_csv_rs::item::record::{Members, Record};
    ///
    /// struct Point {
    ///     x: i64,
    ///     y: i64,
    ///     label: Option<String>,
    /// }
    ///
    /// impl Record for Point {
    ///     fn describe(members: &mut Members<Self>) {
    ///         members
    ///             .constructor(&["x", "y", "label"], |args| {
    ///                 Ok(Point {
    ///                     x: args.get("x")?,
    ///                     y: args.get("y")?,
    ///                     label: args.get("label")?,
    ///                 })
    ///             })
    ///             .column_getter(Column::new("x", ValueType::Int), |p| p.x)
    ///             .column_getter(Column::new("y", ValueType::Int), |p| p.y)
    ///             .column_getter(
    ///                 Column::builder("label", ValueType::Text).optional(true).build(),
    ///                 |p| p.label.clone(),
    ///             );
    ///     }
    /// }
    /// ```
    pub fn constructor<F>(&mut self, params: &[&str], construct: F) -> &mut Self
    where
        F: Fn(&ConstructorArgs) -> Result<T, BindingError> + Send + Sync + 'static,
    {
        self.initializer = Some(Initializer::Constructor {
            params: params.iter().map(|p| p.to_string()).collect(),
            construct: Arc::new(construct),
        });
        self
    }

    pub(crate) fn into_declared_columns(self) -> Vec<(Column, Accessor<T>)> {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::ValueType;

    #[derive(Default)]
    struct Sample {
        count: u8,
        label: Option<String>,
    }

    #[test]
    fn typed_accessors_convert_values() {
        let set = setter(|s: &mut Sample, v: u8| s.count = v);
        let get = getter(|s: &Sample| s.count);

        let mut sample = Sample::default();
        set(&mut sample, Value::Int(9)).unwrap();
        assert_eq!(get(&sample), Some(Value::Int(9)));

        assert!(matches!(
            set(&mut sample, Value::Int(1000)),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(set(&mut sample, Value::from("9")).is_err());
        assert_eq!(sample.count, 9);
    }

    #[test]
    fn optional_members_read_as_absent() {
        let get = getter(|s: &Sample| s.label.clone());
        assert_eq!(get(&Sample::default()), None);
    }

    #[test]
    fn constructor_arguments_map_absence() {
        let names = vec!["count".to_string(), "label".to_string()];
        let args = ConstructorArgs::new(&names, vec![Some(Value::Int(3)), None]);

        assert_eq!(args.get::<u8>("count"), Ok(3));
        assert_eq!(args.get::<Option<String>>("label"), Ok(None));
        assert!(matches!(
            args.get::<String>("label"),
            Err(BindingError::ConstructionFailure(_))
        ));
        assert!(args.get::<u8>("other").is_err());
    }

    #[test]
    fn members_keep_registration_order_of_columns() {
        let mut members = Members::<Sample>::default();
        members
            .column(Column::new("count", ValueType::Int), |s| s.count, |s, v| s.count = v)
            .column_getter(Column::new("double", ValueType::Int), |s| i64::from(s.count) * 2);

        let names: Vec<_> = members
            .into_declared_columns()
            .into_iter()
            .map(|(column, _)| column.name().to_string())
            .collect();
        assert_eq!(names, vec!["count", "double"]);
    }
}
