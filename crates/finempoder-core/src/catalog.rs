//! Static lesson catalog for the shipped course modules.
//!
//! Each module lists its lessons in navigation order. Lesson codes carry
//! their position as a numeric suffix (`L01` is first), which is what
//! [`order_index`] extracts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// Course modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKey {
    /// Budgeting.
    Presupuesto,
    /// Saving.
    Ahorro,
    /// Investing.
    Inversion,
}

impl ModuleKey {
    pub const ALL: [ModuleKey; 3] = [Self::Presupuesto, Self::Ahorro, Self::Inversion];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Presupuesto => "presupuesto",
            Self::Ahorro => "ahorro",
            Self::Inversion => "inversion",
        }
    }

    /// Lessons of this module in navigation order.
    pub fn lessons(&self) -> &'static [LessonDef] {
        match self {
            Self::Presupuesto => PRESUPUESTO,
            Self::Ahorro => AHORRO,
            Self::Inversion => INVERSION,
        }
    }

    /// Ordered lesson codes, the shape the aggregator and unlock rules take.
    pub fn lesson_ids(&self) -> Vec<&'static str> {
        self.lessons().iter().map(|l| l.id).collect()
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&'static LessonDef> {
        self.lessons().iter().find(|l| l.id == lesson_id)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKey {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "presupuesto" => Ok(Self::Presupuesto),
            "ahorro" => Ok(Self::Ahorro),
            "inversion" => Ok(Self::Inversion),
            other => Err(ProgressError::UnknownModule(other.to_string())),
        }
    }
}

/// Presentation style of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Content,
    Quiz,
    Simulator,
    Challenge,
    Feedback,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonDef {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: LessonKind,
}

const fn lesson(id: &'static str, title: &'static str, kind: LessonKind) -> LessonDef {
    LessonDef { id, title, kind }
}

/// Zero-based position encoded in a lesson code's numeric suffix.
///
/// `L01` → `Some(0)`, `L10` → `Some(9)`. Returns `None` when the code has
/// no trailing digits or the number is zero.
pub fn order_index(lesson_id: &str) -> Option<usize> {
    let prefix_len = lesson_id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let digits = &lesson_id[prefix_len..];
    if digits.is_empty() {
        return None;
    }
    digits.parse::<usize>().ok()?.checked_sub(1)
}

use LessonKind::{Challenge, Content, Feedback, Quiz, Simulator};

static PRESUPUESTO: &[LessonDef] = &[
    lesson("L01", "¿Por qué hacer un presupuesto?", Content),
    lesson("L02", "Ingresos: fijos y variables", Quiz),
    lesson("L03", "Gastos fijos, variables y hormiga", Simulator),
    lesson("L04", "Cómo registrar ingresos y gastos", Simulator),
    lesson("L05", "Clasifica tus gastos", Simulator),
    lesson("L06", "Cálculo de balance mensual", Simulator),
    lesson("L07", "Ajuste del presupuesto", Simulator),
    lesson("L08", "Fugas financieras y crisis", Content),
    lesson("L09", "La regla 50-30-20", Content),
    lesson("L10", "Plan de metas financieras SMART", Challenge),
    lesson("L11", "Presupuesto familiar y app digital", Content),
    lesson("L12", "Presupuesto en tiempos de crisis", Simulator),
    lesson("L13", "Retroalimentación con Finni", Content),
    lesson("L14", "Evaluación: ¿Controlas tus finanzas?", Quiz),
    lesson("L15", "Reto final: crea tu presupuesto real", Challenge),
];

static AHORRO: &[LessonDef] = &[
    lesson("L01", "¿Qué significa ahorrar?", Content),
    lesson("L02", "Ahorro informal vs. formal", Simulator),
    lesson("L03", "Ventajas del ahorro formal", Content),
    lesson("L04", "Define tu meta (SMART)", Simulator),
    lesson("L05", "Método 50-30-20 aplicado al ahorro", Simulator),
    lesson("L06", "Plan 1-3-6 (fondo de emergencia)", Simulator),
    lesson("L07", "Ingresos variables: cómo ahorrar igual", Simulator),
    lesson("L08", "Ahorro de emergencia en acción", Simulator),
    lesson("L09", "Automatiza tu ahorro", Content),
    lesson("L10", "Interés simple vs. compuesto", Simulator),
    lesson("L11", "Micro-reto: tres depósitos seguidos", Challenge),
    lesson("L12", "Ahorro y seguros", Quiz),
    lesson("L13", "Empujoncitos financieros", Content),
    lesson("L14", "Autoevaluación del hábito de ahorro", Quiz),
    lesson("L15", "Reto final: tu meta alcanzable", Challenge),
];

static INVERSION: &[LessonDef] = &[
    lesson("L01", "¿Qué es invertir?", Content),
    lesson("L02", "Ahorro vs. inversión", Simulator),
    lesson("L03", "Rendimiento, riesgo, plazo y liquidez", Quiz),
    lesson("L04", "Solo invierte tus excedentes", Simulator),
    lesson("L05", "Mapa de instrumentos de inversión", Simulator),
    lesson("L06", "Instrumentos de deuda: CETES, BONDES, PRLV", Content),
    lesson("L07", "Renta variable: fondos y acciones", Content),
    lesson("L08", "Perfil del inversionista", Quiz),
    lesson("L09", "Diversificación inteligente", Simulator),
    lesson("L10", "Fraudes y promesas irreales", Content),
    lesson("L11", "Comisiones e impuestos", Simulator),
    lesson("L12", "Inflación y rendimiento real", Simulator),
    lesson("L13", "Plan de inversión personal", Challenge),
    lesson("L14", "Retroalimentación con Finni", Feedback),
    lesson("L15", "Reto final: tu primera inversión simulada", Challenge),
];
