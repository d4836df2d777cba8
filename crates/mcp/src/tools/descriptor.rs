// Declarative tool descriptors and their JSON-Schema rendering

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// JSON-Schema type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Rust types that can be declared as tool parameters.
pub trait SchemaType {
    const PARAM_TYPE: ParamType;
}

macro_rules! schema_type {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(impl SchemaType for $ty {
            const PARAM_TYPE: ParamType = $kind;
        })+
    };
}

schema_type!(ParamType::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
schema_type!(ParamType::Number => f32, f64);
schema_type!(ParamType::Boolean => bool);
schema_type!(ParamType::String => String, &str, char);

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    /// True when the parameter has no default value
    pub required: bool,
}

/// Name, description and ordered parameter list of a tool.
///
/// Serializes as `{name, description, inputSchema}` with `inputSchema`
/// properties in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            descriptor: ToolDescriptor {
                name: name.into(),
                description: description.into(),
                parameters: Vec::new(),
            },
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of the parameters without defaults, in declaration order
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON-Schema object describing the parameters
    pub fn input_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.param_type.as_str(),
                        "description": p.description,
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }
}

impl Serialize for ToolDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolDescriptor", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("inputSchema", &self.input_schema())?;
        state.end()
    }
}

/// Builds a [`ToolDescriptor`] from declared parameters
#[derive(Debug, Clone)]
pub struct ToolDescriptorBuilder {
    descriptor: ToolDescriptor,
}

impl ToolDescriptorBuilder {
    /// Declare a required parameter
    pub fn param<T: SchemaType>(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(name.into(), T::PARAM_TYPE, description.into(), true)
    }

    /// Declare a parameter that has a default value
    pub fn optional<T: SchemaType>(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(name.into(), T::PARAM_TYPE, description.into(), false)
    }

    pub fn build(self) -> ToolDescriptor {
        self.descriptor
    }

    fn push(mut self, name: String, param_type: ParamType, description: String, required: bool) -> Self {
        self.descriptor.parameters.push(ParameterSpec {
            name,
            param_type,
            description,
            required,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ToolDescriptor {
        ToolDescriptor::builder("trackProgress", "Records or reports study progress")
            .param::<String>("user_id", "User identifier")
            .param::<&str>("topic", "Topic studied")
            .optional::<f64>("hours", "Hours studied")
            .optional::<bool>("report_only", "Only report")
            .build()
    }

    #[test]
    fn test_type_mapping() {
        let descriptor = ToolDescriptor::builder("t", "d")
            .param::<i64>("a", "")
            .param::<u32>("b", "")
            .param::<f32>("c", "")
            .param::<f64>("d", "")
            .param::<bool>("e", "")
            .param::<String>("f", "")
            .param::<char>("g", "")
            .build();

        let types: Vec<ParamType> = descriptor.parameters.iter().map(|p| p.param_type).collect();
        assert_eq!(
            types,
            vec![
                ParamType::Integer,
                ParamType::Integer,
                ParamType::Number,
                ParamType::Number,
                ParamType::Boolean,
                ParamType::String,
                ParamType::String,
            ]
        );
    }

    #[test]
    fn test_required_iff_no_default() {
        let descriptor = sample();
        assert_eq!(descriptor.required(), vec!["user_id", "topic"]);
        assert!(!descriptor.parameter("hours").unwrap().required);
        assert!(descriptor.parameter("missing").is_none());
    }

    #[test]
    fn test_serialized_schema_preserves_declaration_order() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["name"], "trackProgress");
        assert_eq!(json["inputSchema"]["type"], "object");
        assert_eq!(json["inputSchema"]["required"], serde_json::json!(["user_id", "topic"]));
        assert_eq!(json["inputSchema"]["properties"]["hours"]["type"], "number");

        let names: Vec<&String> = json["inputSchema"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(names, vec!["user_id", "topic", "hours", "report_only"]);
    }

    #[test]
    fn test_builder_is_deterministic() {
        assert_eq!(sample(), sample());
        assert_eq!(
            serde_json::to_string(&sample()).unwrap(),
            serde_json::to_string(&sample()).unwrap()
        );
    }
}
