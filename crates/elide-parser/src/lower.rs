use crate::annotations::{parse_barrier_note, BarrierExpectation};
use crate::{ParseError, Rule};
use elide_core::analysis::DefUseChains;
use elide_core::{
    BlockId, FieldSelector, Instruction, Method, MethodBody, Module, Operand, Terminator, Type,
    ValueId,
};
use pest::iterators::Pair;
use std::collections::HashSet;

/// A lowered module plus the barrier expectations written in its text.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    pub module: Module,
    pub expectations: Vec<BarrierExpectation>,
}

pub(crate) fn lower_module(
    name: &str,
    pair: Pair<Rule>,
) -> Result<ParsedModule, ParseError> {
    let mut module = Module::new(name);
    let mut expectations = Vec::new();

    for method_pair in pair.into_inner().filter(|p| p.as_rule() == Rule::method) {
        let method = MethodLowering::new(&mut expectations).lower(method_pair)?;
        if module.get_method(&method.name).is_some() {
            return Err(ParseError::DuplicateMethod(method.name));
        }
        module.add_method(method);
    }

    Ok(ParsedModule {
        module,
        expectations,
    })
}

struct MethodLowering<'a> {
    name: String,
    defined: HashSet<ValueId>,
    expectations: &'a mut Vec<BarrierExpectation>,
}

impl<'a> MethodLowering<'a> {
    fn new(expectations: &'a mut Vec<BarrierExpectation>) -> Self {
        Self {
            name: String::new(),
            defined: HashSet::new(),
            expectations,
        }
    }

    fn lower(mut self, pair: Pair<Rule>) -> Result<Method, ParseError> {
        let mut params = Vec::new();
        let mut blocks = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::method_name => self.name = method_name(inner),
                Rule::params => {
                    for param in inner.into_inner() {
                        let mut parts = param.into_inner();
                        let value = parse_value(next(&mut parts)?)?;
                        let ty = parse_type(next(&mut parts)?)?;
                        params.push((value, ty));
                    }
                }
                Rule::block => blocks.push(inner),
                _ => {}
            }
        }

        let mut method = Method::new(self.name.clone());
        let block_ids = blocks
            .iter()
            .map(|b| {
                let label = b.clone().into_inner().next().ok_or_else(|| self.malformed())?;
                parse_block_ref(label)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(&entry) = block_ids.first() {
            method.body = MethodBody::with_entry(entry);
        }
        for &id in block_ids.iter().skip(1) {
            method.body.create_block_with_id(id).map_err(|_| {
                ParseError::DuplicateBlock {
                    method: self.name.clone(),
                    block: id.to_string(),
                }
            })?;
        }

        for (value, ty) in params {
            self.define(value)?;
            method.add_param(value, ty)?;
        }

        for (block_pair, &block) in blocks.into_iter().zip(&block_ids) {
            self.lower_block(&mut method.body, block, block_pair)?;
        }

        self.check_block_targets(&method.body)?;

        let chains = DefUseChains::build(&method.body)?;
        if let Some(undefined) = chains.undefined_uses().first() {
            return Err(ParseError::UndefinedValue {
                method: self.name.clone(),
                value: undefined.to_string(),
            });
        }

        Ok(method)
    }

    fn lower_block(
        &mut self,
        body: &mut MethodBody,
        block: BlockId,
        pair: Pair<Rule>,
    ) -> Result<(), ParseError> {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::line => {
                    let mut note = None;
                    let mut inst = None;
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::instruction => inst = Some(self.lower_instruction(part)?),
                            Rule::barrier_note => note = parse_barrier_note(part),
                            _ => {}
                        }
                    }
                    let inst = inst.ok_or_else(|| self.malformed())?;
                    let node = body.append(block, inst)?;
                    if let Some((strength, note)) = note {
                        self.expectations.push(BarrierExpectation {
                            method: self.name.clone(),
                            node,
                            strength,
                            note,
                        });
                    }
                }
                Rule::terminator_line => {
                    let term = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::terminator)
                        .ok_or_else(|| self.malformed())?;
                    let term = self.lower_terminator(term)?;
                    body.set_terminator(block, term)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn lower_instruction(&mut self, pair: Pair<Rule>) -> Result<Instruction, ParseError> {
        let inst = pair.into_inner().next().ok_or_else(|| self.malformed())?;
        let rule = inst.as_rule();
        let mut parts = inst.into_inner();

        let lowered = match rule {
            Rule::load => {
                let result = self.define_next(&mut parts)?;
                let ty = parse_op_type(next(&mut parts)?)?;
                let (object, selector) = parse_address(next(&mut parts)?)?;
                Instruction::Load {
                    result,
                    object,
                    selector,
                    ty,
                }
            }
            Rule::store => {
                let ty = parse_op_type(next(&mut parts)?)?;
                let (object, selector) = parse_address(next(&mut parts)?)?;
                let value = parse_value(next(&mut parts)?)?;
                Instruction::Store {
                    object,
                    selector,
                    value,
                    ty,
                }
            }
            Rule::atomic => {
                let result = self.define_next(&mut parts)?;
                let ty = parse_op_type(next(&mut parts)?)?;
                let (object, selector) = parse_address(next(&mut parts)?)?;
                let value = parse_value(next(&mut parts)?)?;
                Instruction::AtomicExchange {
                    result,
                    object,
                    selector,
                    value,
                    ty,
                }
            }
            Rule::alloc => {
                let result = self.define_next(&mut parts)?;
                let class = next(&mut parts)?.as_str().to_string();
                let length = parts.next().map(parse_operand).transpose()?;
                Instruction::Allocate {
                    result,
                    class,
                    length,
                }
            }
            Rule::call => {
                let mut result = None;
                let mut callee = String::new();
                let mut args = Vec::new();
                for part in parts {
                    match part.as_rule() {
                        Rule::value => result = Some(self.define(parse_value(part)?)?),
                        Rule::method_name => callee = method_name(part),
                        Rule::args => {
                            for arg in part.into_inner() {
                                args.push(parse_value(arg)?);
                            }
                        }
                        _ => {}
                    }
                }
                Instruction::Call {
                    result,
                    callee,
                    args,
                }
            }
            Rule::safepoint => Instruction::SafepointPoll,
            Rule::phi => {
                let result = self.define_next(&mut parts)?;
                let mut incoming = Vec::new();
                for arm in parts {
                    let mut arm_parts = arm.into_inner();
                    let block = parse_block_ref(next(&mut arm_parts)?)?;
                    let value = parse_value(next(&mut arm_parts)?)?;
                    incoming.push((block, value));
                }
                Instruction::Phi { result, incoming }
            }
            Rule::iconst => {
                let result = self.define_next(&mut parts)?;
                let value = parse_integer(next(&mut parts)?)?;
                Instruction::Iconst { result, value }
            }
            _ => return Err(self.malformed()),
        };

        Ok(lowered)
    }

    fn lower_terminator(&self, pair: Pair<Rule>) -> Result<Terminator, ParseError> {
        let term = pair.into_inner().next().ok_or_else(|| self.malformed())?;
        let rule = term.as_rule();
        let mut parts = term.into_inner();

        Ok(match rule {
            Rule::jump => Terminator::Jump(parse_block_ref(next(&mut parts)?)?),
            Rule::brif => Terminator::Branch {
                condition: parse_value(next(&mut parts)?)?,
                then_block: parse_block_ref(next(&mut parts)?)?,
                else_block: parse_block_ref(next(&mut parts)?)?,
            },
            Rule::loop_back => {
                let op = next(&mut parts)?;
                Terminator::LoopBack {
                    counted: op.as_str().ends_with(".counted"),
                    header: parse_block_ref(next(&mut parts)?)?,
                }
            }
            Rule::ret => Terminator::Return(parts.next().map(parse_value).transpose()?),
            _ => return Err(self.malformed()),
        })
    }

    fn check_block_targets(&self, body: &MethodBody) -> Result<(), ParseError> {
        let mut targets: Vec<BlockId> = body
            .blocks
            .values()
            .flat_map(|b| b.successors())
            .collect();
        for node in body.nodes() {
            if let Instruction::Phi { incoming, .. } = &node.inst {
                targets.extend(incoming.iter().map(|(b, _)| *b));
            }
        }

        match targets.into_iter().find(|t| !body.blocks.contains_key(t)) {
            Some(missing) => Err(ParseError::UndefinedBlock {
                method: self.name.clone(),
                block: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn define_next(
        &mut self,
        parts: &mut pest::iterators::Pairs<Rule>,
    ) -> Result<ValueId, ParseError> {
        let value = parse_value(next(parts)?)?;
        self.define(value)
    }

    fn define(&mut self, value: ValueId) -> Result<ValueId, ParseError> {
        if !self.defined.insert(value) {
            return Err(ParseError::DuplicateDefinition {
                method: self.name.clone(),
                value: value.to_string(),
            });
        }
        Ok(value)
    }

    fn malformed(&self) -> ParseError {
        ParseError::Malformed(format!("unexpected parse tree in @{}", self.name))
    }
}

fn next<'i>(parts: &mut pest::iterators::Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, ParseError> {
    parts
        .next()
        .ok_or_else(|| ParseError::Malformed("missing operand".to_string()))
}

fn method_name(pair: Pair<Rule>) -> String {
    pair.as_str().trim_start_matches('@').to_string()
}

fn parse_number<T: std::str::FromStr>(text: &str) -> Result<T, ParseError> {
    text.parse()
        .map_err(|_| ParseError::InvalidLiteral(text.to_string()))
}

fn parse_value(pair: Pair<Rule>) -> Result<ValueId, ParseError> {
    parse_number(pair.as_str().trim_start_matches('v')).map(ValueId)
}

fn parse_block_ref(pair: Pair<Rule>) -> Result<BlockId, ParseError> {
    parse_number(pair.as_str().trim_start_matches("block")).map(BlockId)
}

fn parse_integer(pair: Pair<Rule>) -> Result<i64, ParseError> {
    parse_number(pair.as_str())
}

fn parse_type(pair: Pair<Rule>) -> Result<Type, ParseError> {
    Type::from_name(pair.as_str()).ok_or_else(|| ParseError::InvalidLiteral(pair.as_str().to_string()))
}

fn parse_op_type(pair: Pair<Rule>) -> Result<Type, ParseError> {
    let ty = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::Malformed("missing access type".to_string()))?;
    parse_type(ty)
}

fn parse_operand(pair: Pair<Rule>) -> Result<Operand, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::Malformed("empty operand".to_string()))?;
    match inner.as_rule() {
        Rule::value => parse_value(inner).map(Operand::Value),
        _ => parse_integer(inner).map(Operand::Imm),
    }
}

fn parse_address(pair: Pair<Rule>) -> Result<(ValueId, FieldSelector), ParseError> {
    let mut parts = pair.into_inner();
    let object = parse_value(next(&mut parts)?)?;
    let selector = next(&mut parts)?;
    let rule = selector.as_rule();
    let inner = selector
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::Malformed("empty field selector".to_string()))?;

    let selector = match rule {
        Rule::offset => FieldSelector::Offset(parse_integer(inner)?),
        Rule::element => FieldSelector::Element(parse_number(inner.as_str())?),
        _ => FieldSelector::UnknownIndex(parse_value(inner)?),
    };
    Ok((object, selector))
}
